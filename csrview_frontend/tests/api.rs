// SPDX-License-Identifier: Apache-2.0
//! End-to-end tests: the real router on an ephemeral port, driven both by
//! the uploader crate and by raw multipart requests.

use axum::routing::post;
use csrview_frontend::api;
use csrview_uploader::{
    Outcome, Page, SelectedFile, Selection, Uploader, MESSAGE_TARGET, MSG_UPLOADED,
    MSG_UPLOAD_FAILED,
};
use serde_json::json;
use std::{collections::HashMap, net::SocketAddr};

const RSA_CSR: &[u8] = include_bytes!("../../test_csrs/rsa_sha256.csr");
const EC_CSR: &[u8] = include_bytes!("../../test_csrs/ec_sha256.csr");

#[derive(Default)]
struct TestPage {
    texts: HashMap<String, String>,
    missing: Vec<String>,
}

impl Page for TestPage {
    fn set_text(&mut self, id: &str, text: &str) -> bool {
        if self.missing.iter().any(|m| m == id) {
            return false;
        }
        self.texts.insert(id.to_string(), text.to_string());
        true
    }
}

async fn spawn_router(app: axum::Router) -> SocketAddr {
    let server = axum::Server::bind(&"127.0.0.1:0".parse().unwrap())
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn uploader_for(addr: SocketAddr) -> Uploader {
    Uploader::new(format!("http://{}/api/parse-csr", addr))
}

fn selection(name: &str, contents: &[u8]) -> Selection {
    Selection::new(vec![SelectedFile {
        name: name.to_string(),
        contents: contents.to_vec(),
    }])
}

#[tokio::test]
async fn upload_renders_all_fields() {
    let addr = spawn_router(api::app()).await;
    let mut page = TestPage::default();
    let outcome = uploader_for(addr)
        .upload(&selection("test.csr", RSA_CSR), &mut page)
        .await;
    assert_eq!(outcome, Outcome::Uploaded);
    assert_eq!(
        page.texts["subject"],
        "Country Name (C)= DE, State or Province Name (ST)= Berlin, \
         Locality Name (L)= Berlin, Organization Name (O)= MyCompany, \
         Organizational Unit (OU)= IT, Common Name (CN)= www.domain.de"
    );
    assert_eq!(page.texts["publicKeyAlgorithm"], "SHA-256 with RSA");
    assert_eq!(
        page.texts["subjectAltName"],
        "Email Address= info@domain.de, Surname= Muster, Given Name= Max, Title= Engineer"
    );
    assert_eq!(page.texts[MESSAGE_TARGET], MSG_UPLOADED);
}

#[tokio::test]
async fn ecdsa_algorithm_and_empty_alt_names() {
    let addr = spawn_router(api::app()).await;
    let mut page = TestPage::default();
    let outcome = uploader_for(addr)
        .upload(&selection("test.csr", EC_CSR), &mut page)
        .await;
    assert_eq!(outcome, Outcome::Uploaded);
    assert_eq!(page.texts["publicKeyAlgorithm"], "SHA-256 with ECDSA");
    assert_eq!(page.texts["subjectAltName"], "");
}

#[tokio::test]
async fn missing_target_skips_only_that_field() {
    let addr = spawn_router(api::app()).await;
    let mut page = TestPage {
        missing: vec!["subject".to_string()],
        ..TestPage::default()
    };
    let outcome = uploader_for(addr)
        .upload(&selection("test.csr", RSA_CSR), &mut page)
        .await;
    assert_eq!(outcome, Outcome::Uploaded);
    assert!(!page.texts.contains_key("subject"));
    assert_eq!(page.texts["publicKeyAlgorithm"], "SHA-256 with RSA");
    assert!(page.texts.contains_key("subjectAltName"));
    assert_eq!(page.texts[MESSAGE_TARGET], MSG_UPLOADED);
}

#[tokio::test]
async fn first_of_two_files_wins() {
    let addr = spawn_router(api::app()).await;
    let sel = Selection::new(vec![
        SelectedFile {
            name: "first.csr".to_string(),
            contents: EC_CSR.to_vec(),
        },
        SelectedFile {
            name: "second.csr".to_string(),
            contents: b"junk".to_vec(),
        },
    ]);
    let mut page = TestPage::default();
    let outcome = uploader_for(addr).upload(&sel, &mut page).await;
    assert_eq!(outcome, Outcome::Uploaded);
    assert_eq!(page.texts["publicKeyAlgorithm"], "SHA-256 with ECDSA");
}

#[tokio::test]
async fn failure_status_leaves_fields_untouched() {
    let addr = spawn_router(api::app()).await;
    let mut page = TestPage::default();
    let outcome = uploader_for(addr)
        .upload(&selection("junk.csr", b"invalid content"), &mut page)
        .await;
    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(page.texts[MESSAGE_TARGET], MSG_UPLOAD_FAILED);
    assert_eq!(page.texts.len(), 1);
}

#[tokio::test]
async fn malformed_json_body_is_a_failure() {
    let stub = axum::Router::new().route("/api/parse-csr", post(|| async { "not json" }));
    let addr = spawn_router(stub).await;
    let mut page = TestPage::default();
    let outcome = uploader_for(addr)
        .upload(&selection("test.csr", RSA_CSR), &mut page)
        .await;
    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(page.texts[MESSAGE_TARGET], MSG_UPLOAD_FAILED);
    assert_eq!(page.texts.len(), 1);
}

#[tokio::test]
async fn subject_order_on_the_wire() {
    let addr = spawn_router(api::app()).await;
    let form = reqwest::multipart::Form::new().part(
        "csr",
        reqwest::multipart::Part::bytes(RSA_CSR.to_vec()).file_name("test.csr"),
    );
    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/parse-csr", addr))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body["subject"],
        json!([
            "Country Name (C)= DE",
            "State or Province Name (ST)= Berlin",
            "Locality Name (L)= Berlin",
            "Organization Name (O)= MyCompany",
            "Organizational Unit (OU)= IT",
            "Common Name (CN)= www.domain.de",
        ])
    );
    assert_eq!(body["publicKeyAlgorithm"], json!("SHA-256 with RSA"));
    assert_eq!(
        body["subjectAltName"],
        json!([
            "Email Address= info@domain.de",
            "Surname= Muster",
            "Given Name= Max",
            "Title= Engineer",
        ])
    );
}

async fn post_file(addr: SocketAddr, part_name: &str, contents: Vec<u8>) -> reqwest::Response {
    let form = reqwest::multipart::Form::new().part(
        part_name.to_string(),
        reqwest::multipart::Part::bytes(contents).file_name("test.csr"),
    );
    reqwest::Client::new()
        .post(format!("http://{}/api/parse-csr", addr))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn junk_file_is_bad_request() {
    let addr = spawn_router(api::app()).await;
    let resp = post_file(addr, "csr", b"invalid content".to_vec()).await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], json!("Input is not a valid PKCS#10 CSR"));
    assert!(body["exceptionErrorCode"].is_string());
}

#[tokio::test]
async fn empty_file_is_bad_request() {
    let addr = spawn_router(api::app()).await;
    let resp = post_file(addr, "csr", Vec::new()).await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], json!("The provided file is empty"));
}

#[tokio::test]
async fn missing_part_is_bad_request() {
    let addr = spawn_router(api::app()).await;
    let resp = post_file(addr, "other", RSA_CSR.to_vec()).await;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        json!("Required file part 'csr' is not present")
    );
}

#[tokio::test]
async fn upload_page_has_all_targets() {
    let addr = spawn_router(api::app()).await;
    let resp = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert_eq!(
        resp.headers()
            .get(reqwest::header::SERVER)
            .unwrap()
            .to_str()
            .unwrap(),
        "csrview/0.1"
    );
    let body = resp.text().await.unwrap();
    for id in [
        "fileInput",
        "uploadButton",
        "message",
        "subject",
        "publicKeyAlgorithm",
        "subjectAltName",
    ] {
        assert!(body.contains(&format!(r#"id="{}""#, id)), "missing {}", id);
    }
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let addr = spawn_router(api::app()).await;
    let resp = reqwest::get(format!("http://{}/nope", addr)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
