use crate::artifacts::core::error::BruvError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Blob,
    Tree,
    Commit,
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Blob => "blob",
            ObjectType::Tree => "tree",
            ObjectType::Commit => "commit",
        }
    }

    /// Build the `<kind> <length>\0` header that precedes every payload.
    pub fn header(&self, payload_len: usize) -> String {
        format!("{} {}\0", self.as_str(), payload_len)
    }

    /// Split a decompressed object into its kind and payload.
    ///
    /// The declared length must agree with the bytes that follow the NUL.
    pub fn split_object(data: &[u8]) -> anyhow::Result<(ObjectType, &[u8])> {
        let nul = data
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| BruvError::CorruptObject("missing header terminator".to_string()))?;

        let header = std::str::from_utf8(&data[..nul])
            .map_err(|_| BruvError::CorruptObject("header is not valid UTF-8".to_string()))?;
        let (kind, size) = header
            .split_once(' ')
            .ok_or_else(|| BruvError::CorruptObject(format!("malformed header '{header}'")))?;

        let object_type = ObjectType::try_from(kind)?;
        let size = size
            .parse::<usize>()
            .map_err(|_| BruvError::CorruptObject(format!("invalid object length '{size}'")))?;

        let payload = &data[nul + 1..];
        if payload.len() != size {
            return Err(BruvError::CorruptObject(format!(
                "declared length {} does not match payload length {}",
                size,
                payload.len()
            ))
            .into());
        }

        Ok((object_type, payload))
    }
}

impl TryFrom<&str> for ObjectType {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "blob" => Ok(ObjectType::Blob),
            "tree" => Ok(ObjectType::Tree),
            "commit" => Ok(ObjectType::Commit),
            _ => Err(BruvError::CorruptObject(format!("invalid object type '{value}'")).into()),
        }
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
