// SPDX-License-Identifier: Apache-2.0
//! Client half of the upload flow: gathers the selected file, posts it to
//! the parse endpoint and writes the response fields into a page.

use log::{debug, warn};
use serde::Deserialize;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api/parse-csr";

/// Status line shown when nothing is selected.
pub const MSG_SELECT_FILE: &str = "Please select a file!";
/// Status line shown once every field is rendered.
pub const MSG_UPLOADED: &str = "File uploaded successfully!";
/// Status line shown when the upload or the response fails.
pub const MSG_UPLOAD_FAILED: &str = "Error uploading the file.";

/// Identifier of the status line target. Always present on the page.
pub const MESSAGE_TARGET: &str = "message";

/// Response body of the parse endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub subject: Vec<String>,
    pub public_key_algorithm: String,
    pub subject_alt_name: Vec<String>,
}

/// One file offered by the user.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub contents: Vec<u8>,
}

/// The current file selection. Mirrors a file input: any number of files may
/// be selected, only the first is ever uploaded.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    files: Vec<SelectedFile>,
}

impl Selection {
    pub fn new(files: Vec<SelectedFile>) -> Self {
        Self { files }
    }

    /// The file an upload would carry: the first of the selection.
    pub fn attached(&self) -> Option<&SelectedFile> {
        self.files.first()
    }
}

/// Display targets for the parsed fields, keyed by the identifiers the page
/// exposes. Any of them may be absent from a page.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Target {
    Subject,
    PublicKeyAlgorithm,
    SubjectAltName,
}

impl Target {
    pub fn id(self) -> &'static str {
        match self {
            Target::Subject => "subject",
            Target::PublicKeyAlgorithm => "publicKeyAlgorithm",
            Target::SubjectAltName => "subjectAltName",
        }
    }
}

/// Writable handle on the page the handler renders into. `set_text` returns
/// `false` when the page has no element with that identifier; the handler
/// skips the field and keeps going.
pub trait Page {
    fn set_text(&mut self, id: &str, text: &str) -> bool;
}

/// Computes the text for every field target from a response body. The list
/// fields are joined with a comma and a space, the algorithm is shown
/// verbatim.
pub fn display_updates(result: &ParseResult) -> Vec<(Target, String)> {
    vec![
        (Target::Subject, result.subject.join(", ")),
        (
            Target::PublicKeyAlgorithm,
            result.public_key_algorithm.clone(),
        ),
        (Target::SubjectAltName, result.subject_alt_name.join(", ")),
    ]
}

/// Builds the multipart body for one upload: the file bytes under the fixed
/// part name `csr`, nothing else.
pub fn upload_request(file: &SelectedFile) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new().part(
        "csr",
        reqwest::multipart::Part::bytes(file.contents.clone()).file_name(file.name.clone()),
    )
}

#[derive(Debug)]
#[allow(dead_code)] // some fields exist only for the Debug output in the log
pub enum UploadError {
    Reqwest(reqwest::Error),
    BadStatus(reqwest::StatusCode),
    DeserializeError {
        serde_error: serde_json::Error,
        input: bytes::Bytes,
    },
}

/// How one upload cycle ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was selected; no request was made.
    NothingSelected,
    /// Response received and rendered.
    Uploaded,
    /// Transport or decoding failed; the page shows the generic message.
    Failed,
}

/// The upload handler. One instance per endpoint; every call to
/// [`Uploader::upload`] runs a full click cycle against one page.
#[derive(Debug, Clone)]
pub struct Uploader {
    client: reqwest::Client,
    endpoint: String,
}

impl Uploader {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent("csrview/0.1")
                .brotli(true)
                .gzip(true)
                .build()
                .unwrap(),
            endpoint,
        }
    }

    /// Runs one upload cycle: validate the selection, post the first file,
    /// render the response. Every failure past validation ends with the
    /// generic failure message; detail only goes to the log.
    pub async fn upload<P: Page>(&self, selection: &Selection, page: &mut P) -> Outcome {
        let file = match selection.attached() {
            Some(file) => file,
            None => {
                set_or_warn(page, MESSAGE_TARGET, MSG_SELECT_FILE);
                return Outcome::NothingSelected;
            }
        };
        match self.fetch_parse(file).await {
            Ok(result) => {
                for (target, text) in display_updates(&result) {
                    set_or_warn(page, target.id(), &text);
                }
                set_or_warn(page, MESSAGE_TARGET, MSG_UPLOADED);
                Outcome::Uploaded
            }
            Err(err) => {
                warn!("file upload failed: {:?}", err);
                set_or_warn(page, MESSAGE_TARGET, MSG_UPLOAD_FAILED);
                Outcome::Failed
            }
        }
    }

    /// Posts one file and decodes the response body.
    async fn fetch_parse(&self, file: &SelectedFile) -> Result<ParseResult, UploadError> {
        debug!(
            "posting {:?} ({} bytes) to {}",
            file.name,
            file.contents.len(),
            self.endpoint
        );
        let resp = self
            .client
            .post(&self.endpoint)
            .multipart(upload_request(file))
            .send()
            .await
            .map_err(UploadError::Reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(UploadError::BadStatus(status));
        }
        let bytes = resp.bytes().await.map_err(UploadError::Reqwest)?;
        match serde_json::from_slice(&bytes) {
            Ok(v) => Ok(v),
            Err(serde_error) => Err(UploadError::DeserializeError {
                serde_error,
                input: bytes,
            }),
        }
    }
}

fn set_or_warn<P: Page>(page: &mut P, id: &str, text: &str) {
    if !page.set_text(id, text) {
        warn!("page has no element with ID {:?}", id);
    }
}
