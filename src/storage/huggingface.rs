//! HuggingFace model downloader
//!
//! Fetches GGUF model files from HuggingFace Hub into the model scan
//! directory, so the panel can provision models without a browser.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// A `repo/file` reference on HuggingFace Hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubModelRef {
    pub repo_id: String,
    pub filename: String,
}

impl HubModelRef {
    /// Parse the reference forms users paste:
    /// full URLs (`https://huggingface.co/user/repo/blob/main/f.gguf`,
    /// `.../resolve/main/f.gguf`) and short `user/repo/f.gguf`.
    pub fn parse(input: &str) -> Result<Self, String> {
        let input = input.trim();
        let input = input.split(['?', '#']).next().unwrap_or(input);

        let path = input
            .strip_prefix("https://huggingface.co/")
            .or_else(|| input.strip_prefix("http://huggingface.co/"))
            .unwrap_or(input);

        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.len() < 3 {
            return Err("Expected a repo and file, like user/repo/model.gguf".to_string());
        }

        let repo_id = format!("{}/{}", parts[0], parts[1]);

        // URL forms carry a blob/resolve segment plus revision before the file.
        let filename = match parts[2] {
            "blob" | "resolve" if parts.len() > 4 => parts[4..].join("/"),
            "blob" | "resolve" => {
                return Err("URL is missing the file name".to_string());
            }
            _ => parts[2..].join("/"),
        };

        if !filename.to_lowercase().ends_with(".gguf") {
            return Err(format!("Not a GGUF file: {}", filename));
        }

        Ok(Self { repo_id, filename })
    }

    pub fn download_url(&self) -> String {
        format!(
            "https://huggingface.co/{}/resolve/main/{}",
            self.repo_id, self.filename
        )
    }

    /// Local file name: the repo path segments are flattened out.
    fn local_filename(&self) -> String {
        self.filename.replace('/', "__")
    }
}

/// Download a GGUF file into `dest_dir`, reporting (downloaded, total)
/// bytes as chunks arrive. The file lands under its hub name; an existing
/// non-empty copy short-circuits the download.
pub async fn download_model(
    reference: &HubModelRef,
    dest_dir: &Path,
    mut progress: impl FnMut(u64, u64),
) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dest_dir)
        .map_err(|e| format!("Failed to create model directory: {}", e))?;

    let output_path = dest_dir.join(reference.local_filename());
    let temp_path = dest_dir.join(format!("{}.part", reference.local_filename()));

    if let Ok(metadata) = std::fs::metadata(&output_path) {
        if metadata.len() > 0 {
            tracing::info!("model already present: {}", output_path.display());
            return Ok(output_path);
        }
    }

    let url = reference.download_url();
    tracing::info!("downloading {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(3600))
        .build()
        .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

    let mut response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| format!("Download failed: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Download failed with status: {}", response.status()));
    }

    let total_size = response
        .content_length()
        .ok_or("Could not determine file size")?;

    let mut temp_file = File::create(&temp_path)
        .await
        .map_err(|e| format!("Failed to create temp file: {}", e))?;

    let mut downloaded: u64 = 0;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("Download error: {}", e))?
    {
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| format!("Write error: {}", e))?;
        downloaded += chunk.len() as u64;
        progress(downloaded, total_size);
    }
    temp_file
        .flush()
        .await
        .map_err(|e| format!("Write error: {}", e))?;

    if downloaded != total_size {
        return Err(format!(
            "Download incomplete: got {} bytes, expected {}",
            downloaded, total_size
        ));
    }

    std::fs::rename(&temp_path, &output_path)
        .map_err(|e| format!("Failed to move downloaded file: {}", e))?;

    tracing::info!("download complete: {}", output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_blob_url() {
        let parsed = HubModelRef::parse(
            "https://huggingface.co/TheBloke/Llama-2-7B-GGUF/blob/main/llama-2-7b.Q4_K_M.gguf",
        )
        .unwrap();
        assert_eq!(parsed.repo_id, "TheBloke/Llama-2-7B-GGUF");
        assert_eq!(parsed.filename, "llama-2-7b.Q4_K_M.gguf");
    }

    #[test]
    fn test_parse_resolve_url_with_query() {
        let parsed = HubModelRef::parse(
            "https://huggingface.co/user/repo/resolve/main/model.gguf?download=true",
        )
        .unwrap();
        assert_eq!(parsed.filename, "model.gguf");
    }

    #[test]
    fn test_parse_short_form() {
        let parsed = HubModelRef::parse("TheBloke/Llama-2-7B-GGUF/llama-2-7b.Q4_K_M.gguf").unwrap();
        assert_eq!(parsed.repo_id, "TheBloke/Llama-2-7B-GGUF");
        assert_eq!(parsed.filename, "llama-2-7b.Q4_K_M.gguf");
        assert_eq!(
            parsed.download_url(),
            "https://huggingface.co/TheBloke/Llama-2-7B-GGUF/resolve/main/llama-2-7b.Q4_K_M.gguf"
        );
    }

    #[test]
    fn test_parse_rejects_incomplete_refs() {
        assert!(HubModelRef::parse("just-a-user").is_err());
        assert!(HubModelRef::parse("user/repo").is_err());
        assert!(HubModelRef::parse("user/repo/readme.md").is_err());
    }

    #[test]
    fn test_nested_filename_is_flattened_locally() {
        let parsed = HubModelRef::parse("user/repo/sub/dir/model.gguf").unwrap();
        assert_eq!(parsed.filename, "sub/dir/model.gguf");
        assert_eq!(parsed.local_filename(), "sub__dir__model.gguf");
    }
}
