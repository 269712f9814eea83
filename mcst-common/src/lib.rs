pub mod block_storage;
pub mod entity;
pub mod math;
pub mod minecraft_types;

pub use quartz_nbt;

use quartz_nbt::{NbtCompound, NbtTag};
use std::fmt::{Display, Formatter};

/// Data version stamped onto every structure file we write. Matches 1.18.2, which is the last
/// version whose structure layout this crate understands without a schema fixer.
pub const DATA_VERSION: i32 = 2975;

/// Error generated when pulling a typed field out of an NBT payload fails
#[derive(Debug)]
pub enum NbtFieldError {
    Missing(String),
    WrongType(String),
}

impl Display for NbtFieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Missing(s) => write!(f, "NbtFieldError::Missing({:?})", s),
            Self::WrongType(s) => write!(f, "NbtFieldError::WrongType({:?})", s),
        }
    }
}

impl std::error::Error for NbtFieldError {}

/// Handy abstraction for grabbing fields out of block entity and entity payloads
pub trait NbtExt {
    fn get_tag(&self, name: &str) -> Option<&NbtTag>;

    fn get_string(&self, name: &str) -> Result<&str, NbtFieldError> {
        match self.get_tag(name) {
            Some(NbtTag::String(s)) => Ok(s.as_str()),
            Some(_) => Err(NbtFieldError::WrongType(name.to_owned())),
            None => Err(NbtFieldError::Missing(name.to_owned())),
        }
    }

    fn get_int(&self, name: &str) -> Result<i32, NbtFieldError> {
        match self.get_tag(name) {
            Some(NbtTag::Byte(v)) => Ok(*v as i32),
            Some(NbtTag::Short(v)) => Ok(*v as i32),
            Some(NbtTag::Int(v)) => Ok(*v),
            Some(_) => Err(NbtFieldError::WrongType(name.to_owned())),
            None => Err(NbtFieldError::Missing(name.to_owned())),
        }
    }

    fn get_string_with_default<'a>(
        &'a self,
        name: &str,
        default: &'a str,
    ) -> Result<&'a str, NbtFieldError> {
        self.get_string(name).or_else(|e| match e {
            NbtFieldError::Missing(_) => Ok(default),
            _ => Err(e),
        })
    }

    fn get_int_with_default(&self, name: &str, default: i32) -> Result<i32, NbtFieldError> {
        self.get_int(name).or_else(|e| match e {
            NbtFieldError::Missing(_) => Ok(default),
            _ => Err(e),
        })
    }
}

impl NbtExt for NbtCompound {
    fn get_tag(&self, name: &str) -> Option<&NbtTag> {
        self.inner().get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_cover_missing_fields() {
        let mut tag = NbtCompound::new();
        tag.insert("pool", "minecraft:village/houses");
        tag.insert("placement_priority", 3i32);

        assert_eq!(tag.get_int_with_default("placement_priority", 0).unwrap(), 3);
        assert_eq!(tag.get_int_with_default("selection_priority", 0).unwrap(), 0);
        assert_eq!(
            tag.get_string_with_default("target", "minecraft:empty").unwrap(),
            "minecraft:empty"
        );
        assert!(matches!(
            tag.get_int_with_default("pool", 0),
            Err(NbtFieldError::WrongType(_))
        ));
    }
}
