//! Fetch and parse STL files

use gloo_net::http::Request;
use js_sys::Uint8Array;
use stlview_core::platform::{LoadCallback, MeshLoader};
use stlview_core::LoadError;
use tracing::debug;
use wasm_bindgen_futures::spawn_local;

use crate::engine::WebGeometry;
use crate::platform::js_error;
use crate::three;

pub struct StlLoader {
    parser: three::STLLoader,
}

impl StlLoader {
    pub fn new() -> Self {
        Self {
            parser: three::STLLoader::new(),
        }
    }
}

impl MeshLoader for StlLoader {
    type Geometry = WebGeometry;

    fn load(&self, uri: &str, on_complete: LoadCallback<WebGeometry>) {
        let uri = uri.to_string();
        let parser = self.parser.clone();
        spawn_local(async move {
            let result = fetch(&uri).await.and_then(|bytes| parse(&parser, &bytes));
            on_complete(result);
        });
    }
}

async fn fetch(uri: &str) -> Result<Vec<u8>, LoadError> {
    let response = Request::get(uri)
        .send()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;

    if !response.ok() {
        return Err(LoadError::Http {
            status: response.status(),
            status_text: response.status_text(),
        });
    }

    let bytes = response
        .binary()
        .await
        .map_err(|e| LoadError::Network(e.to_string()))?;
    debug!(uri, bytes = bytes.len(), "Fetched mesh");
    Ok(bytes)
}

fn parse(parser: &three::STLLoader, bytes: &[u8]) -> Result<WebGeometry, LoadError> {
    let buffer = Uint8Array::from(bytes).buffer();
    parser
        .parse(&buffer)
        .map(WebGeometry)
        .map_err(|e| LoadError::Parse(js_error(e).to_string()))
}
