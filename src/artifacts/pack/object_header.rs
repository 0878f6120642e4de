//! Per-object header inside a pack
//!
//! The first byte is `[continuation:1][kind:3][size bits 0-3]`; each
//! following byte is `[continuation:1][next 7 size bits]`, least significant
//! group first.

use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_type::ObjectType;
use byteorder::ReadBytesExt;
use derive_new::new;
use std::io::Read;

const KIND_COMMIT: u8 = 1;
const KIND_TREE: u8 = 2;
const KIND_BLOB: u8 = 3;
const KIND_OFS_DELTA: u8 = 6;
const KIND_REF_DELTA: u8 = 7;

const CONTINUATION: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct ObjectHeader {
    pub object_type: ObjectType,
    pub size: u64,
}

impl ObjectHeader {
    pub fn write_to(&self, out: &mut Vec<u8>) {
        let kind = match self.object_type {
            ObjectType::Commit => KIND_COMMIT,
            ObjectType::Tree => KIND_TREE,
            ObjectType::Blob => KIND_BLOB,
        };

        let mut size = self.size >> 4;
        let mut byte = (kind << 4) | (self.size & 0x0f) as u8;

        while size != 0 {
            out.push(byte | CONTINUATION);
            byte = (size & 0x7f) as u8;
            size >>= 7;
        }
        out.push(byte);
    }

    pub fn read_from(reader: &mut impl Read) -> anyhow::Result<Self> {
        let truncated = |_| BruvError::CorruptPack("truncated object header".into());

        let mut byte = reader.read_u8().map_err(truncated)?;
        let kind = (byte >> 4) & 0x07;
        let mut size = (byte & 0x0f) as u64;
        let mut shift = 4;

        while byte & CONTINUATION != 0 {
            if shift > 57 {
                return Err(BruvError::CorruptPack("object size overflows 64 bits".into()).into());
            }
            byte = reader.read_u8().map_err(truncated)?;
            size |= ((byte & 0x7f) as u64) << shift;
            shift += 7;
        }

        let object_type = match kind {
            KIND_COMMIT => ObjectType::Commit,
            KIND_TREE => ObjectType::Tree,
            KIND_BLOB => ObjectType::Blob,
            KIND_OFS_DELTA | KIND_REF_DELTA => {
                return Err(BruvError::Unsupported("delta objects in packs".into()).into());
            }
            _ => return Err(BruvError::CorruptPack(format!("unknown object kind {kind}")).into()),
        };

        Ok(ObjectHeader { object_type, size })
    }
}
