use crate::areas::database::Database;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::pack::object_header::ObjectHeader;
use crate::artifacts::pack::{CHECKSUM_SIZE, HEADER_SIZE, SIGNATURE, VERSION};
use byteorder::{ByteOrder, WriteBytesExt};
use bytes::Bytes;
use derive_new::new;
use sha1::{Digest, Sha1};
use std::collections::BTreeSet;
use std::io::{Read, Write};

/// Serializes stored objects into a pack
#[derive(Debug, new)]
pub struct PackEncoder<'d> {
    database: &'d Database,
}

impl PackEncoder<'_> {
    /// Pack the given objects in id order
    ///
    /// Fails as a whole if any object cannot be read.
    pub fn encode(&self, oids: &BTreeSet<ObjectId>) -> anyhow::Result<Bytes> {
        let count = u32::try_from(oids.len())
            .map_err(|_| BruvError::Unsupported(format!("{} objects in one pack", oids.len())))?;

        let mut pack = Vec::new();
        pack.write_all(SIGNATURE)?;
        pack.write_u32::<byteorder::NetworkEndian>(VERSION)?;
        pack.write_u32::<byteorder::NetworkEndian>(count)?;

        for oid in oids {
            let (object_type, payload) = self.database.get(oid)?;

            ObjectHeader::new(object_type, payload.len() as u64).write_to(&mut pack);
            pack.write_all(&Database::compress(&payload)?)?;
        }

        let checksum = Sha1::digest(&pack);
        pack.write_all(checksum.as_slice())?;

        Ok(Bytes::from(pack))
    }
}

/// Installs the objects of a pack into a database
#[derive(Debug, new)]
pub struct PackDecoder<'d> {
    database: &'d Database,
}

impl PackDecoder<'_> {
    /// Verify and unpack a pack, returning the installed ids in pack order
    ///
    /// Each object's id is derived from its kind and payload; ids are never
    /// taken on trust from the sender.
    pub fn decode(&self, pack: &[u8]) -> anyhow::Result<Vec<ObjectId>> {
        if pack.len() < HEADER_SIZE + CHECKSUM_SIZE {
            return Err(BruvError::CorruptPack(format!("{} bytes is too short", pack.len())).into());
        }

        let (content, checksum) = pack.split_at(pack.len() - CHECKSUM_SIZE);
        if Sha1::digest(content).as_slice() != checksum {
            return Err(BruvError::CorruptPack("checksum does not match contents".into()).into());
        }

        let (header, mut body) = content.split_at(HEADER_SIZE);
        if &header[0..4] != SIGNATURE {
            return Err(BruvError::CorruptPack("invalid signature".into()).into());
        }
        let version = byteorder::NetworkEndian::read_u32(&header[4..8]);
        if version != VERSION {
            return Err(BruvError::CorruptPack(format!("unsupported version {version}")).into());
        }
        let count = byteorder::NetworkEndian::read_u32(&header[8..12]);

        // every object takes at least a header byte and a zlib header
        if count as usize > body.len() / 2 {
            return Err(BruvError::CorruptPack(format!(
                "{count} objects cannot fit in {} bytes",
                body.len()
            ))
            .into());
        }

        let mut installed = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let object_header = ObjectHeader::read_from(&mut body)?;
            let payload = Self::inflate_one(&mut body, object_header.size)?;

            installed.push(self.database.put(object_header.object_type, &payload)?);
        }

        if !body.is_empty() {
            return Err(BruvError::CorruptPack(format!(
                "{} unexpected bytes after last object",
                body.len()
            ))
            .into());
        }

        Ok(installed)
    }

    /// Inflate exactly one zlib stream from the front of `body` and advance past it
    fn inflate_one(body: &mut &[u8], size: u64) -> anyhow::Result<Vec<u8>> {
        let mut decoder = flate2::bufread::ZlibDecoder::new(*body);
        let mut payload = Vec::new();
        (&mut decoder)
            .take(size.saturating_add(1))
            .read_to_end(&mut payload)
            .map_err(|_| BruvError::CorruptPack("object data is not valid zlib".into()))?;

        if payload.len() as u64 > size {
            return Err(BruvError::CorruptPack(format!(
                "object declares {size} bytes but inflates to more"
            ))
            .into());
        }
        if payload.len() as u64 != size {
            return Err(BruvError::CorruptPack(format!(
                "object declares {size} bytes but inflates to {}",
                payload.len()
            ))
            .into());
        }

        let consumed = decoder.total_in() as usize;
        let rest = *body;
        *body = &rest[consumed..];

        Ok(payload)
    }
}
