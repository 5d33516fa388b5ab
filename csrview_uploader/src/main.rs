// SPDX-License-Identifier: Apache-2.0
use csrview_uploader::{Outcome, Page, SelectedFile, Selection, Uploader, DEFAULT_ENDPOINT};
use std::{env, fs, process};

/// Renders updates as terminal lines, standing in for the upload page.
struct TermPage;

impl Page for TermPage {
    fn set_text(&mut self, id: &str, text: &str) -> bool {
        println!("{}: {}", id, text);
        true
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = env::args().skip(1);
    let path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("usage: csrview_uploader <csr file> [endpoint]");
            process::exit(2);
        }
    };
    let endpoint = args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

    let contents = fs::read(&path)?;
    let selection = Selection::new(vec![SelectedFile {
        name: path,
        contents,
    }]);

    let uploader = Uploader::new(endpoint);
    match uploader.upload(&selection, &mut TermPage).await {
        Outcome::Uploaded => Ok(()),
        _ => process::exit(1),
    }
}
