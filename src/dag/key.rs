// src/dag/key.rs

//! Target identity: `library.object.type.source`.

use std::fmt;
use std::str::FromStr;

use crate::errors::BuildError;
use crate::types::{CompilationKind, ObjectType, SourceType};

/// Normalized identity of one build target.
///
/// All parts are upper-cased on parse, so equality and hashing are
/// case-insensitive with respect to the original key string. The
/// compilation kind is derived from the type pair and never appears in the
/// key string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetKey {
    library: String,
    object_name: String,
    object_type: ObjectType,
    source_type: SourceType,
    kind: CompilationKind,
}

impl TargetKey {
    pub fn new(
        library: &str,
        object_name: &str,
        object_type: ObjectType,
        source_type: SourceType,
    ) -> Result<Self, BuildError> {
        let library = library.trim().to_uppercase();
        let object_name = object_name.trim().to_uppercase();
        let raw = format!("{library}.{object_name}.{object_type}.{source_type}");

        if library.is_empty() {
            return Err(BuildError::invalid_key(raw, "library name is required"));
        }
        if object_name.is_empty() {
            return Err(BuildError::invalid_key(raw, "object name is required"));
        }
        let kind = CompilationKind::for_target(source_type, object_type).ok_or_else(|| {
            BuildError::invalid_key(
                &raw,
                format!("no creation command builds a {object_type} from {source_type} source"),
            )
        })?;

        Ok(Self {
            library,
            object_name,
            object_type,
            source_type,
            kind,
        })
    }

    pub fn library(&self) -> &str {
        &self.library
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn object_type(&self) -> ObjectType {
        self.object_type
    }

    pub fn source_type(&self) -> SourceType {
        self.source_type
    }

    pub fn compilation_kind(&self) -> CompilationKind {
        self.kind
    }

    /// `LIBRARY/OBJECT`, the form used in creation commands.
    pub fn qualified_object(&self) -> String {
        format!("{}/{}", self.library, self.object_name)
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.library, self.object_name, self.object_type, self.source_type
        )
    }
}

impl FromStr for TargetKey {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [library, object, object_type, source_type] = parts.as_slice() else {
            return Err(BuildError::invalid_key(
                s,
                "expected library.objectName.objectType.sourceType",
            ));
        };

        let object_type =
            ObjectType::from_str(object_type).map_err(|e| BuildError::invalid_key(s, e))?;
        let source_type =
            SourceType::from_str(source_type).map_err(|e| BuildError::invalid_key(s, e))?;

        TargetKey::new(library, object, object_type, source_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_normalizes() {
        let key: TargetKey = "mylib.hello.pgm.rpgle".parse().unwrap();
        assert_eq!(key.library(), "MYLIB");
        assert_eq!(key.object_name(), "HELLO");
        assert_eq!(key.object_type(), ObjectType::Pgm);
        assert_eq!(key.source_type(), SourceType::Rpgle);
        assert_eq!(key.compilation_kind(), CompilationKind::CrtBndRpg);
        assert_eq!(key.qualified_object(), "MYLIB/HELLO");
    }

    #[test]
    fn display_round_trips() {
        for raw in ["MyliB.Hello.PGM.RPGle", "CURLIB.ARTICLE1.LF.DDS", "a.b.srvpgm.bnd"] {
            let key: TargetKey = raw.parse().unwrap();
            let again: TargetKey = key.to_string().parse().unwrap();
            assert_eq!(key, again);
            assert_eq!(key.to_string(), raw.to_uppercase());
        }
    }

    #[test]
    fn keys_differing_only_in_case_are_equal() {
        let a: TargetKey = "mylib.hello.pgm.rpgle".parse().unwrap();
        let b: TargetKey = "MYLIB.HELLO.PGM.RPGLE".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!("mylib.hello.pgm".parse::<TargetKey>().is_err());
        assert!("mylib.hello.pgm.rpgle.extra".parse::<TargetKey>().is_err());
        assert!(".hello.pgm.rpgle".parse::<TargetKey>().is_err());
        assert!("mylib..pgm.rpgle".parse::<TargetKey>().is_err());
        assert!("mylib.hello.exe.rpgle".parse::<TargetKey>().is_err());
        assert!("mylib.hello.pgm.dds".parse::<TargetKey>().is_err());
    }
}
