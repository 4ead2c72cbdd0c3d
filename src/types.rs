// src/types.rs

//! Object, source and compilation vocabulary shared across the crate.

use std::fmt;
use std::str::FromStr;

/// Type of the compiled object a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectType {
    Pgm,
    Srvpgm,
    Module,
    Table,
    Lf,
    Index,
    View,
    Alias,
    Procedure,
    Function,
    Trigger,
    Sequence,
    Pf,
    Dspf,
    Prtf,
    Cmd,
    Mnu,
    Qmqry,
    Dtaara,
    Dtaq,
    Bnddir,
    Msgf,
}

impl ObjectType {
    pub const ALL: [ObjectType; 22] = [
        ObjectType::Pgm,
        ObjectType::Srvpgm,
        ObjectType::Module,
        ObjectType::Table,
        ObjectType::Lf,
        ObjectType::Index,
        ObjectType::View,
        ObjectType::Alias,
        ObjectType::Procedure,
        ObjectType::Function,
        ObjectType::Trigger,
        ObjectType::Sequence,
        ObjectType::Pf,
        ObjectType::Dspf,
        ObjectType::Prtf,
        ObjectType::Cmd,
        ObjectType::Mnu,
        ObjectType::Qmqry,
        ObjectType::Dtaara,
        ObjectType::Dtaq,
        ObjectType::Bnddir,
        ObjectType::Msgf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectType::Pgm => "PGM",
            ObjectType::Srvpgm => "SRVPGM",
            ObjectType::Module => "MODULE",
            ObjectType::Table => "TABLE",
            ObjectType::Lf => "LF",
            ObjectType::Index => "INDEX",
            ObjectType::View => "VIEW",
            ObjectType::Alias => "ALIAS",
            ObjectType::Procedure => "PROCEDURE",
            ObjectType::Function => "FUNCTION",
            ObjectType::Trigger => "TRIGGER",
            ObjectType::Sequence => "SEQUENCE",
            ObjectType::Pf => "PF",
            ObjectType::Dspf => "DSPF",
            ObjectType::Prtf => "PRTF",
            ObjectType::Cmd => "CMD",
            ObjectType::Mnu => "MNU",
            ObjectType::Qmqry => "QMQRY",
            ObjectType::Dtaara => "DTAARA",
            ObjectType::Dtaq => "DTAQ",
            ObjectType::Bnddir => "BNDDIR",
            ObjectType::Msgf => "MSGF",
        }
    }

    /// Class used when a textual reference is looked up in the registry.
    ///
    /// Several object types share one class: a `DCL-F CUSTOMER` reference is
    /// satisfied by a PF, a DDL table or a view alike.
    pub fn resolve_class(self) -> Option<ResolveClass> {
        match self {
            ObjectType::Pf
            | ObjectType::Lf
            | ObjectType::Dspf
            | ObjectType::Prtf
            | ObjectType::Table
            | ObjectType::View
            | ObjectType::Index => Some(ResolveClass::File),
            ObjectType::Pgm | ObjectType::Procedure => Some(ResolveClass::Program),
            ObjectType::Module => Some(ResolveClass::Module),
            ObjectType::Srvpgm => Some(ResolveClass::ServiceProgram),
            ObjectType::Bnddir => Some(ResolveClass::BindingDirectory),
            ObjectType::Dtaara => Some(ResolveClass::DataArea),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        ObjectType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("invalid object type: {s}"))
    }
}

/// Dialect of the source a target is compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceType {
    Rpg,
    Rpgle,
    Sqlrpgle,
    Clp,
    Clle,
    Sql,
    Bnd,
    Dds,
    Cmd,
    Mnu,
    Qmqry,
    Bnddir,
    Dtaara,
    Dtaq,
    Msgf,
}

impl SourceType {
    pub const ALL: [SourceType; 15] = [
        SourceType::Rpg,
        SourceType::Rpgle,
        SourceType::Sqlrpgle,
        SourceType::Clp,
        SourceType::Clle,
        SourceType::Sql,
        SourceType::Bnd,
        SourceType::Dds,
        SourceType::Cmd,
        SourceType::Mnu,
        SourceType::Qmqry,
        SourceType::Bnddir,
        SourceType::Dtaara,
        SourceType::Dtaq,
        SourceType::Msgf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceType::Rpg => "RPG",
            SourceType::Rpgle => "RPGLE",
            SourceType::Sqlrpgle => "SQLRPGLE",
            SourceType::Clp => "CLP",
            SourceType::Clle => "CLLE",
            SourceType::Sql => "SQL",
            SourceType::Bnd => "BND",
            SourceType::Dds => "DDS",
            SourceType::Cmd => "CMD",
            SourceType::Mnu => "MNU",
            SourceType::Qmqry => "QMQRY",
            SourceType::Bnddir => "BNDDIR",
            SourceType::Dtaara => "DTAARA",
            SourceType::Dtaq => "DTAQ",
            SourceType::Msgf => "MSGF",
        }
    }

    /// Default source physical file for a member-addressed source.
    pub fn default_source_file(self, object: ObjectType) -> &'static str {
        match self {
            SourceType::Rpg => "QRPGSRC",
            SourceType::Rpgle => "QRPGLESRC",
            SourceType::Sqlrpgle => "QSQLRPGSRC",
            SourceType::Bnd => "QSRVSRC",
            SourceType::Clp | SourceType::Clle => "QCLSRC",
            SourceType::Cmd => "QCMDSRC",
            SourceType::Bnddir => "QBNDSRC",
            SourceType::Dtaara => "QDTAARA",
            SourceType::Dtaq => "QDTAQSRC",
            SourceType::Msgf => "QMSGFSRC",
            SourceType::Dds => match object {
                ObjectType::Dspf => "QDSPFSRC",
                ObjectType::Lf => "QLFSRC",
                ObjectType::Prtf => "QPRTFSRC",
                _ => "QPFSRC",
            },
            SourceType::Sql | SourceType::Mnu | SourceType::Qmqry => "QSQLSRC",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase();
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("invalid source type: {s}"))
    }
}

/// Creation command family a target is built with.
///
/// Derived from `(SourceType, ObjectType)` by [`CompilationKind::for_target`];
/// it gates which extraction rules run over a target's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CompilationKind {
    CrtRpgMod,
    CrtSqlRpgi,
    CrtBndRpg,
    CrtRpgPgm,
    CrtClMod,
    CrtBndCl,
    CrtClPgm,
    RunSqlStm,
    CrtSrvPgm,
    CrtDspf,
    CrtLf,
    CrtPrtf,
    CrtMnu,
    CrtQmQry,
    CrtPf,
    CrtCmd,
    CrtBndDir,
    CrtDtaAra,
    CrtDtaQ,
    CrtMsgF,
}

impl CompilationKind {
    /// Fixed lookup table from source/object type to creation command.
    ///
    /// Returns `None` for combinations that cannot be built.
    pub fn for_target(source: SourceType, object: ObjectType) -> Option<Self> {
        use CompilationKind::*;
        use ObjectType as O;
        use SourceType as S;

        let kind = match (source, object) {
            (S::Bnd, O::Srvpgm) => CrtSrvPgm,
            (S::Rpg, O::Pgm) => CrtRpgPgm,
            (S::Rpgle, O::Module) => CrtRpgMod,
            (S::Rpgle, O::Pgm) => CrtBndRpg,
            (S::Sqlrpgle, O::Module | O::Pgm) => CrtSqlRpgi,
            (S::Clp, O::Pgm) => CrtClPgm,
            (S::Clle, O::Module) => CrtClMod,
            (S::Clle, O::Pgm) => CrtBndCl,
            (
                S::Sql,
                O::Table
                | O::Index
                | O::View
                | O::Alias
                | O::Procedure
                | O::Function
                | O::Trigger
                | O::Sequence,
            ) => RunSqlStm,
            (S::Dds, O::Pf) => CrtPf,
            (S::Dds, O::Dspf) => CrtDspf,
            (S::Dds, O::Lf) => CrtLf,
            (S::Dds, O::Prtf) => CrtPrtf,
            (S::Cmd, O::Cmd) => CrtCmd,
            (S::Mnu, O::Mnu) => CrtMnu,
            (S::Qmqry, O::Qmqry) => CrtQmQry,
            (S::Bnddir, O::Bnddir) => CrtBndDir,
            (S::Dtaara, O::Dtaara) => CrtDtaAra,
            (S::Dtaq, O::Dtaq) => CrtDtaQ,
            (S::Msgf, O::Msgf) => CrtMsgF,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompilationKind::CrtRpgMod => "CRTRPGMOD",
            CompilationKind::CrtSqlRpgi => "CRTSQLRPGI",
            CompilationKind::CrtBndRpg => "CRTBNDRPG",
            CompilationKind::CrtRpgPgm => "CRTRPGPGM",
            CompilationKind::CrtClMod => "CRTCLMOD",
            CompilationKind::CrtBndCl => "CRTBNDCL",
            CompilationKind::CrtClPgm => "CRTCLPGM",
            CompilationKind::RunSqlStm => "RUNSQLSTM",
            CompilationKind::CrtSrvPgm => "CRTSRVPGM",
            CompilationKind::CrtDspf => "CRTDSPF",
            CompilationKind::CrtLf => "CRTLF",
            CompilationKind::CrtPrtf => "CRTPRTF",
            CompilationKind::CrtMnu => "CRTMNU",
            CompilationKind::CrtQmQry => "CRTQMQRY",
            CompilationKind::CrtPf => "CRTPF",
            CompilationKind::CrtCmd => "CRTCMD",
            CompilationKind::CrtBndDir => "CRTBNDDIR",
            CompilationKind::CrtDtaAra => "CRTDTAARA",
            CompilationKind::CrtDtaQ => "CRTDTAQ",
            CompilationKind::CrtMsgF => "CRTMSGF",
        }
    }

    /// ILE RPG compilers (free and fixed form, with or without embedded SQL).
    pub fn is_rpg_ile(self) -> bool {
        matches!(
            self,
            CompilationKind::CrtRpgMod | CompilationKind::CrtBndRpg | CompilationKind::CrtSqlRpgi
        )
    }

    /// Any RPG compiler, including the fixed-form-only OPM one.
    pub fn is_rpg(self) -> bool {
        self.is_rpg_ile() || self == CompilationKind::CrtRpgPgm
    }

    /// Any control-language compiler.
    pub fn is_cl(self) -> bool {
        matches!(
            self,
            CompilationKind::CrtClMod | CompilationKind::CrtBndCl | CompilationKind::CrtClPgm
        )
    }
}

impl fmt::Display for CompilationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What shape of target a textual reference must resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResolveClass {
    File,
    Program,
    Module,
    ServiceProgram,
    BindingDirectory,
    DataArea,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_table_covers_common_pairs() {
        assert_eq!(
            CompilationKind::for_target(SourceType::Rpgle, ObjectType::Pgm),
            Some(CompilationKind::CrtBndRpg)
        );
        assert_eq!(
            CompilationKind::for_target(SourceType::Sqlrpgle, ObjectType::Module),
            Some(CompilationKind::CrtSqlRpgi)
        );
        assert_eq!(
            CompilationKind::for_target(SourceType::Sql, ObjectType::View),
            Some(CompilationKind::RunSqlStm)
        );
        assert_eq!(
            CompilationKind::for_target(SourceType::Dds, ObjectType::Lf),
            Some(CompilationKind::CrtLf)
        );
        assert_eq!(CompilationKind::for_target(SourceType::Dds, ObjectType::Pgm), None);
    }

    #[test]
    fn parses_types_case_insensitively() {
        assert_eq!("srvpgm".parse::<ObjectType>(), Ok(ObjectType::Srvpgm));
        assert_eq!(" SqlRpgLe ".parse::<SourceType>(), Ok(SourceType::Sqlrpgle));
        assert!("EXE".parse::<ObjectType>().is_err());
    }

    #[test]
    fn file_shaped_objects_share_a_class() {
        for t in [ObjectType::Pf, ObjectType::Lf, ObjectType::Table, ObjectType::View] {
            assert_eq!(t.resolve_class(), Some(ResolveClass::File));
        }
        assert_eq!(ObjectType::Dtaq.resolve_class(), None);
    }

    #[test]
    fn dds_default_source_file_depends_on_object() {
        assert_eq!(SourceType::Dds.default_source_file(ObjectType::Dspf), "QDSPFSRC");
        assert_eq!(SourceType::Dds.default_source_file(ObjectType::Pf), "QPFSRC");
        assert_eq!(SourceType::Rpgle.default_source_file(ObjectType::Pgm), "QRPGLESRC");
    }
}
