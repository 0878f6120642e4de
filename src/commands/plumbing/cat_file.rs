use crate::areas::repository::Repository;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;

/// Shortest prefix accepted for an abbreviated object id
const MIN_PREFIX_LENGTH: usize = 4;

impl Repository {
    pub fn cat_file(&self, object_id: &str, show_type: bool) -> anyhow::Result<()> {
        let object_id = self.expand_object_id(object_id)?;

        if show_type {
            let (object_type, _) = self.database().get(&object_id)?;
            writeln!(self.writer(), "{object_type}")?;
        } else {
            let object = self.database().parse_object(&object_id)?;
            writeln!(self.writer(), "{}", object.display())?;
        }

        Ok(())
    }

    /// Resolve a full or abbreviated object id to a stored object
    pub fn expand_object_id(&self, prefix: &str) -> anyhow::Result<ObjectId> {
        if prefix.len() == OBJECT_ID_LENGTH {
            return ObjectId::try_parse(prefix.to_string())
                .map_err(|_| BruvError::NotFound(format!("'{prefix}' is not an object id")).into());
        }

        if prefix.len() < MIN_PREFIX_LENGTH || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(BruvError::NotFound(format!("'{prefix}' is not an object id")).into());
        }

        let mut candidates = self.database().find_objects_by_prefix(&prefix.to_ascii_lowercase())?;
        match candidates.len() {
            0 => Err(BruvError::NotFound(format!("no object matches '{prefix}'")).into()),
            1 => Ok(candidates.remove(0)),
            count => Err(BruvError::NotFound(format!(
                "short object id '{prefix}' is ambiguous ({count} candidates)"
            ))
            .into()),
        }
    }
}
