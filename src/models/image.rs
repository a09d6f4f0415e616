use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};

/// Bookkeeping row for an uploaded image file. The URL is the public path
/// the file was saved under; posts reference it by that URL.
#[derive(Serialize, Deserialize, Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = crate::models::schema::images)]
pub struct Image {
    pub image_id: String,
    pub image_url: String,
}
