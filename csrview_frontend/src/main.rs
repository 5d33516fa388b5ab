// SPDX-License-Identifier: Apache-2.0
use csrview_frontend::api;
use std::{env, net::SocketAddr};

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    env_logger::init();

    let addr: SocketAddr = env::var("CSRVIEW_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
        .parse()
        .expect("invalid CSRVIEW_ADDR");
    axum::Server::bind(&addr)
        .serve(api::app().into_make_service())
        .await
        .unwrap();
}
