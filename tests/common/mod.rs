#![allow(dead_code)]

pub mod temp_files {
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Creates a routes file with the given extension; removed on drop
    pub fn create_temp_routes(content: &str, ext: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .prefix("routeset_test_")
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    pub fn create_temp_yaml(content: &str) -> NamedTempFile {
        create_temp_routes(content, "yaml")
    }
}

pub mod handlers {
    use routeset::{Dispatch, HandlerResponse, Params, Request, StaticRegistry};
    use serde_json::json;

    /// Registry whose handlers answer with their own id and the params.
    pub fn echo_registry(ids: &[&str]) -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        for id in ids {
            let id = id.to_string();
            registry.register(id.clone(), move |_req: &Request, params: &Params| {
                Dispatch::Handled(HandlerResponse::json(
                    200,
                    json!({ "handler": id, "params": params }),
                ))
            });
        }
        registry
    }

    /// Handler that always passes the request on.
    pub fn cascade(_req: &Request, _params: &Params) -> Dispatch {
        Dispatch::Cascade
    }

    pub fn handled_by(response: &HandlerResponse) -> &str {
        response.body["handler"].as_str().unwrap_or_default()
    }

    pub fn param<'a>(response: &'a HandlerResponse, name: &str) -> Option<&'a str> {
        response.body["params"][name].as_str()
    }
}
