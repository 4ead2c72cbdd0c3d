// src/scan/rules.rs

//! Per-dialect extraction of referenced object names from source text.
//!
//! Every rule is a textual heuristic: it recognizes the usual spellings of
//! a reference and leaves anything unusual alone. Which rules run is gated
//! by the target's [`CompilationKind`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::dag::key::TargetKey;
use crate::types::{CompilationKind, ResolveClass};

/// The textual form a dependency was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceKind {
    BndDir,
    ExtPgm,
    Call,
    DtaAra,
    ExtName,
    Dclf,
    FixedFile,
    DclF,
    Sql,
    PFile,
    JFile,
    Ref,
    RefFld,
    ExtProc,
    Module,
    BndSrvPgm,
}

/// What a reference name is looked up against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// A declared target of this class with the same object name.
    Class(ResolveClass),
    /// The module exporting a procedure of this name.
    ExportedProcedure,
}

impl ReferenceKind {
    /// Rules that read source text.
    pub const TEXT_RULES: [ReferenceKind; 14] = [
        ReferenceKind::BndDir,
        ReferenceKind::ExtPgm,
        ReferenceKind::Call,
        ReferenceKind::DtaAra,
        ReferenceKind::ExtName,
        ReferenceKind::Dclf,
        ReferenceKind::FixedFile,
        ReferenceKind::DclF,
        ReferenceKind::Sql,
        ReferenceKind::PFile,
        ReferenceKind::JFile,
        ReferenceKind::Ref,
        ReferenceKind::RefFld,
        ReferenceKind::ExtProc,
    ];

    /// Rules that read compile parameters instead of source.
    pub const PARAMETER_RULES: [ReferenceKind; 2] =
        [ReferenceKind::Module, ReferenceKind::BndSrvPgm];

    /// Label used in diagnostics, e.g. `F-SPEC('CUSTFILE')`.
    pub fn label(self) -> &'static str {
        match self {
            ReferenceKind::BndDir => "BNDDIR",
            ReferenceKind::ExtPgm => "EXTPGM",
            ReferenceKind::Call => "CALL",
            ReferenceKind::DtaAra => "DTAARA",
            ReferenceKind::ExtName => "EXTNAME",
            ReferenceKind::Dclf => "DCLF",
            ReferenceKind::FixedFile => "F-SPEC",
            ReferenceKind::DclF => "DCL-F",
            ReferenceKind::Sql => "SQL",
            ReferenceKind::PFile => "PFILE",
            ReferenceKind::JFile => "JFILE",
            ReferenceKind::Ref => "REF",
            ReferenceKind::RefFld => "REFFLD",
            ReferenceKind::ExtProc => "EXTPROC",
            ReferenceKind::Module => "MODULE",
            ReferenceKind::BndSrvPgm => "BNDSRVPGM",
        }
    }

    pub fn resolution(self) -> Resolution {
        match self {
            ReferenceKind::BndDir => Resolution::Class(ResolveClass::BindingDirectory),
            ReferenceKind::ExtPgm | ReferenceKind::Call => Resolution::Class(ResolveClass::Program),
            ReferenceKind::DtaAra => Resolution::Class(ResolveClass::DataArea),
            ReferenceKind::ExtName
            | ReferenceKind::Dclf
            | ReferenceKind::FixedFile
            | ReferenceKind::DclF
            | ReferenceKind::Sql
            | ReferenceKind::PFile
            | ReferenceKind::JFile
            | ReferenceKind::Ref
            | ReferenceKind::RefFld => Resolution::Class(ResolveClass::File),
            ReferenceKind::ExtProc => Resolution::ExportedProcedure,
            ReferenceKind::Module => Resolution::Class(ResolveClass::Module),
            ReferenceKind::BndSrvPgm => Resolution::Class(ResolveClass::ServiceProgram),
        }
    }

    /// Whether this rule runs for targets built with `kind`.
    pub fn applies_to(self, kind: CompilationKind) -> bool {
        use CompilationKind::*;
        match self {
            ReferenceKind::BndDir => matches!(
                kind,
                CrtBndRpg | CrtSqlRpgi | CrtRpgMod | CrtBndCl | CrtClMod
            ),
            ReferenceKind::ExtPgm | ReferenceKind::DclF => kind.is_rpg_ile(),
            ReferenceKind::Call | ReferenceKind::DtaAra => kind.is_rpg() || kind.is_cl(),
            ReferenceKind::ExtName | ReferenceKind::FixedFile => kind.is_rpg(),
            ReferenceKind::Dclf => kind.is_cl(),
            ReferenceKind::Sql => matches!(kind, CrtSqlRpgi | RunSqlStm),
            ReferenceKind::PFile | ReferenceKind::JFile => kind == CrtLf,
            ReferenceKind::Ref => matches!(kind, CrtPf | CrtDspf | CrtPrtf),
            ReferenceKind::RefFld => matches!(kind, CrtDspf | CrtPrtf),
            ReferenceKind::ExtProc => kind.is_rpg_ile() || matches!(kind, CrtClMod | CrtBndCl),
            ReferenceKind::Module => kind == CrtSrvPgm,
            ReferenceKind::BndSrvPgm => matches!(kind, CrtSrvPgm | CrtBndRpg | CrtBndCl | CrtSqlRpgi),
        }
    }

    /// Compile parameter a parameter rule reads.
    pub fn parameter(self) -> Option<&'static str> {
        match self {
            ReferenceKind::Module => Some("MODULE"),
            ReferenceKind::BndSrvPgm => Some("BNDSRVPGM"),
            _ => None,
        }
    }

    /// Raw candidate names found by this rule, before normalization.
    fn candidates(self, kind: CompilationKind, source: &str) -> Vec<String> {
        match self {
            ReferenceKind::BndDir => operands(&BNDDIR, source),
            ReferenceKind::ExtPgm => captures(&EXTPGM, source),
            ReferenceKind::Call => {
                let mut names = captures(&CALL_QUOTED, source);
                names.extend(captures(&CALL_PGM, source));
                if kind.is_cl() {
                    names.extend(positional_calls(source));
                }
                names
            }
            ReferenceKind::DtaAra => data_areas(source),
            ReferenceKind::ExtName => captures(&EXTNAME, source),
            ReferenceKind::Dclf => captures(&DCLF, source),
            ReferenceKind::FixedFile => fixed_file_specs(source),
            ReferenceKind::DclF => captures(&DCL_F, source),
            ReferenceKind::Sql => sql_tables(source),
            ReferenceKind::PFile => operands(&PFILE, source),
            ReferenceKind::JFile => operands(&JFILE, source),
            ReferenceKind::Ref => captures(&DDS_REF, source),
            ReferenceKind::RefFld => captures(&DDS_REFFLD, source),
            ReferenceKind::ExtProc => procedure_calls(source),
            ReferenceKind::Module | ReferenceKind::BndSrvPgm => Vec::new(),
        }
    }

    fn normalize(self, raw: &str) -> Option<String> {
        match self {
            ReferenceKind::ExtProc => normalize_procedure_name(raw),
            _ => normalize_object_name(raw),
        }
    }
}

/// One extracted reference: how it was written and the normalized name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub name: String,
}

impl Reference {
    pub fn new(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Run every text rule that applies to `kind` over `source`.
///
/// The result is deduplicated: a name referenced many times through the
/// same form appears once.
pub fn extract_references(kind: CompilationKind, source: &str) -> BTreeSet<Reference> {
    let mut refs = BTreeSet::new();
    for rule in ReferenceKind::TEXT_RULES {
        if !rule.applies_to(kind) {
            continue;
        }
        for raw in rule.candidates(kind, source) {
            if let Some(name) = rule.normalize(&raw) {
                refs.insert(Reference::new(rule, name));
            }
        }
    }
    refs
}

/// References carried by compile parameters (`MODULE`, `BNDSRVPGM`).
///
/// Values are whitespace separated; parentheses, qualifiers and special
/// values such as `*DEFER` are dropped. `*SRVPGM` in a module list names the
/// module called like the service program itself.
pub fn parameter_references(
    key: &TargetKey,
    params: &BTreeMap<String, String>,
) -> BTreeSet<Reference> {
    let mut refs = BTreeSet::new();
    for rule in ReferenceKind::PARAMETER_RULES {
        if !rule.applies_to(key.compilation_kind()) {
            continue;
        }
        let Some(value) = rule.parameter().and_then(|p| params.get(p)) else {
            continue;
        };
        for token in value.split(|c: char| c.is_whitespace() || c == '(' || c == ')') {
            let token = token.trim();
            if rule == ReferenceKind::Module && token.eq_ignore_ascii_case("*SRVPGM") {
                refs.insert(Reference::new(rule, key.object_name()));
                continue;
            }
            if let Some(name) = normalize_object_name(token) {
                refs.insert(Reference::new(rule, name));
            }
        }
    }
    refs
}

static OBJECT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z$#@][A-Z0-9$#@_]{0,9}$").expect("valid object name pattern"));

static PROCEDURE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z$#@_][A-Z0-9$#@_]*$").expect("valid procedure name pattern"));

/// Upper-case, unquote and strip a `LIB/` or `SCHEMA.` qualifier.
///
/// Returns `None` unless what is left looks like an object name, which
/// filters special values (`*LIBL`), host variables and column ranges.
pub fn normalize_object_name(raw: &str) -> Option<String> {
    let unquoted: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '\'' && *c != '"')
        .collect::<String>()
        .to_uppercase();
    let name = unquoted.rsplit(['/', '.']).next().unwrap_or_default().trim();
    OBJECT_NAME.is_match(name).then(|| name.to_string())
}

/// Upper-case and unquote a procedure name. Procedure names are not
/// limited to ten characters and are never qualified.
pub fn normalize_procedure_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_matches(['\'', '"']).trim().to_uppercase();
    PROCEDURE_NAME.is_match(&name).then_some(name)
}

static BNDDIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bBNDDIR\s*\(([^)]*)\)").expect("valid BNDDIR pattern"));

static EXTPGM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEXTPGM\s*\(\s*'([^']+)'\s*\)").expect("valid EXTPGM pattern")
});

static CALL_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCALL\s+'([^']+)'").expect("valid CALL pattern"));

static CALL_PGM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:CALL|TFRCTL)\s+PGM\s*\(\s*([^)\s]+)").expect("valid CALL PGM pattern")
});

/// CL `CALL WORKER`: the program given positionally rather than as `PGM(...)`.
static CALL_POSITIONAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:CALL|TFRCTL)\s+([A-Z$#@][A-Z0-9$#@_/.]*)(\s*\()?")
        .expect("valid positional CALL pattern")
});

static DTAARA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bDTAARA\s*\(([^)]*)\)").expect("valid DTAARA pattern"));

static EXTNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEXTNAME\s*\(\s*([^):\s]+)").expect("valid EXTNAME pattern")
});

static DCLF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDCLF\s+(?:FILE\s*\(\s*)?([^)\s]+)").expect("valid DCLF pattern")
});

/// Column 6 `F`, name in columns 7-16, usage in column 17.
static FIXED_F_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.{5}F(.{10})[IOUBC]").expect("valid F-spec pattern"));

static DCL_F: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bDCL-F\s+([A-Z0-9$#@_./]+)").expect("valid DCL-F pattern")
});

const SQL_NAME: &str = r#""?[A-Z0-9$#@_]+"?(?:[./]"?[A-Z0-9$#@_]+"?)?"#;

static SQL_TABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(FROM|JOIN|INTO|UPDATE|REFERENCES)\s+({SQL_NAME})"
    ))
    .expect("valid SQL table pattern")
});

/// Next `, name` in a `FROM a [AS x], b` list, anchored at the slice start.
static SQL_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:(?:AS\s+)?[A-Z0-9$#@_]+\s*)?,\s*({SQL_NAME})"
    ))
    .expect("valid SQL chain pattern")
});

static SQL_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:INDEX\s+\S+|INSERT|UPDATE|DELETE)\s+ON\s+({SQL_NAME})"
    ))
    .expect("valid SQL ON pattern")
});

static PFILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bPFILE\s*\(([^)]*)\)").expect("valid PFILE pattern"));

static JFILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bJFILE\s*\(([^)]*)\)").expect("valid JFILE pattern"));

static DDS_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bREF\s*\(\s*([^)\s]+)").expect("valid REF pattern"));

static DDS_REFFLD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)REFFLD\s*\(\s*[^)\s]+\s+([^)\s]+)").expect("valid REFFLD pattern")
});

static EXTPROC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEXTPROC\s*\(\s*(?:\*[A-Z]+\s*:\s*)?'([^']+)'").expect("valid EXTPROC pattern")
});

/// Free-form prototype header up to its terminating semicolon.
static DCL_PR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)\bDCL-PR\s+([A-Z0-9$#@_]+)([^;]*);").expect("valid DCL-PR pattern")
});

/// Fixed-form prototype: `D` in column 6, name in 7-21, `PR` in 24-25.
static FIXED_PR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^.{5}D(.{15}).{2}PR\b").expect("valid D-spec pattern"));

static EXT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bEXT(?:PGM|PROC)\b").expect("valid keyword pattern"));

static DCLCASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bEXTPROC\s*\(\s*\*DCLCASE\s*\)").expect("valid DCLCASE pattern")
});

static CALLPRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bCALLPRC\s+(?:PRC\s*\(\s*)?'?([A-Z0-9$#@_]+)").expect("valid CALLPRC pattern")
});

fn captures(re: &Regex, source: &str) -> Vec<String> {
    re.captures_iter(source)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Split the parenthesized operand list of each match on `:` and blanks.
fn operands(re: &Regex, source: &str) -> Vec<String> {
    re.captures_iter(source)
        .filter_map(|c| c.get(1))
        .flat_map(|m| split_operands(m.as_str()))
        .collect()
}

fn split_operands(inner: &str) -> Vec<String> {
    inner
        .split(|c: char| c == ':' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `DTAARA(*AUTO:'NAME')`, `DTAARA(LIB/NAME (1 10))`: the first operand
/// that looks like a name. `*VAR` means the name is a variable, not a
/// constant, so nothing can be resolved.
fn data_areas(source: &str) -> Vec<String> {
    DTAARA
        .captures_iter(source)
        .filter_map(|c| c.get(1))
        .filter(|m| !m.as_str().to_uppercase().contains("*VAR"))
        .filter_map(|m| {
            split_operands(m.as_str())
                .into_iter()
                .find(|op| normalize_object_name(op).is_some())
        })
        .collect()
}

fn fixed_file_specs(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| FIXED_F_SPEC.captures(line))
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Table names after query keywords, including the comma-chained names of
/// a `FROM a, b` list.
fn sql_tables(source: &str) -> Vec<String> {
    let mut names = Vec::new();

    for caps in SQL_TABLE.captures_iter(source) {
        let (Some(keyword), Some(first)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        names.push(first.as_str().to_string());

        if !keyword.as_str().eq_ignore_ascii_case("FROM") {
            continue;
        }
        let mut pos = first.end();
        while let Some(next) = SQL_CHAIN.captures(&source[pos..]) {
            let Some(name) = next.get(1) else { break };
            names.push(name.as_str().to_string());
            pos += name.end();
        }
    }

    names.extend(captures(&SQL_ON, source));
    names
}

/// Procedures called through prototypes or `CALLPRC`.
fn procedure_calls(source: &str) -> Vec<String> {
    let mut names = captures(&EXTPROC, source);

    for caps in DCL_PR.captures_iter(source) {
        let keywords = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        if calls_own_name(keywords) {
            if let Some(name) = caps.get(1) {
                names.push(name.as_str().to_string());
            }
        }
    }

    for line in source.lines() {
        if !calls_own_name(line) {
            continue;
        }
        if let Some(name) = FIXED_PR.captures(line).and_then(|c| c.get(1)) {
            names.push(name.as_str().trim().to_string());
        }
    }

    names.extend(captures(&CALLPRC, source));
    names
}

/// A prototype names its own procedure unless an external name is given.
/// `EXTPROC(*DCLCASE)` keeps the declared name.
fn calls_own_name(keywords: &str) -> bool {
    !EXT_KEYWORD.is_match(keywords) || DCLCASE.is_match(keywords)
}

fn positional_calls(source: &str) -> Vec<String> {
    CALL_POSITIONAL
        .captures_iter(source)
        .filter(|caps| caps.get(2).is_none())
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}
