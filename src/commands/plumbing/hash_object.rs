use crate::areas::repository::Repository;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use std::path::Path;

impl Repository {
    pub fn hash_object(&self, object_path: &Path, write: bool) -> anyhow::Result<ObjectId> {
        let content = self.workspace().read_file(object_path)?;

        let object_id = if write {
            self.database().put(ObjectType::Blob, &content)?
        } else {
            ObjectId::for_content(ObjectType::Blob, &content)
        };

        writeln!(self.writer(), "{object_id}")?;

        Ok(object_id)
    }
}
