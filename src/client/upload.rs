use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use super::{check_status, decode_json, MilibroClient};
use crate::{
    error::{Error, Result},
    lookup::secure_image_url,
    traits::Names,
    types::user::{UploadedImage, User},
};

fn mime_type_for_file(file_name: &str) -> &'static str {
    match Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        _ => "image/jpeg",
    }
}

impl MilibroClient {
    /// `POST /cloudinary/upload` with the picture as `image` and the owner as
    /// `userId`. Returns the hosted image URL.
    pub async fn upload_avatar(
        &self,
        user_id: &str,
        contents: Vec<u8>,
        file_name: &str,
    ) -> Result<String> {
        let url = self.endpoint("/cloudinary/upload");
        debug!(url = %url, file = %file_name, size = contents.len(), "uploading avatar");

        let part = Part::bytes(contents)
            .file_name(file_name.to_string())
            .mime_str(mime_type_for_file(file_name))?;
        let form = Form::new()
            .part("image", part)
            .text("userId", user_id.to_string());

        let response = self.send_authed(self.http.post(&url).multipart(form)).await?;
        let response = check_status(response, User::NAME_SINGULAR, user_id).await?;
        let uploaded: UploadedImage = decode_json(response, "upload response").await?;
        info!(user = %user_id, "avatar uploaded");
        Ok(secure_image_url(&uploaded.image_url))
    }

    pub async fn upload_avatar_file(&self, user_id: &str, path: &Path) -> Result<String> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation("image", "Not a file path"))?
            .to_string();
        let contents = tokio::fs::read(path).await?;
        self.upload_avatar(user_id, contents, &file_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_types() {
        assert_eq!(mime_type_for_file("me.PNG"), "image/png");
        assert_eq!(mime_type_for_file("me.jpg"), "image/jpeg");
        assert_eq!(mime_type_for_file("me"), "image/jpeg");
    }
}
