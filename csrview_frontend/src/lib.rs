// SPDX-License-Identifier: Apache-2.0
//! Frontend internals live here rather than in the binary so the router can
//! be exercised by the integration tests.

pub mod api;
pub mod res;

pub const PRODUCT_NAME: &str = match option_env!("CSRVIEW_PRODUCT_NAME") {
    // unwrap_or isn't const stable
    Some(name) => name,
    None => "Csrview",
};
