//! FFI interface for C/C++ interop
//!
//! One entry point runs any engine mode over caller-supplied HTML.
//! Requests and results are passed as JSON for simplicity and type safety.
//!
//! Request: `{"mode": "simple" | "raw" | "census", "trim": ..., "selectors": [...],
//! "labels": [...], "group_width": n, "output_format": "html" | "json"}`
//!
//! Result: `{"data": [...]}` for records, `{"html": "..."}` for raw html
//! output, `{"tags": [...]}` for a census.

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::document::Document;
use crate::engine::{self, ExtractionSpec, OutputFormat, RawOutput};
use crate::error::ScrapeError;

/// Result struct returned to C
/// Both pointers are owned by Rust and must be freed via free_extraction_result
#[repr(C)]
pub struct ExtractionResultFFI {
    /// JSON-serialized result (null-terminated)
    pub json_ptr: *mut c_char,
    /// Error message if extraction failed (null-terminated), or null on success
    pub error_ptr: *mut c_char,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Simple,
    Raw,
    Census,
}

/// Request accepted by [`extract_from_html`].
#[derive(Debug, Clone, Deserialize)]
pub struct HtmlRequest {
    pub mode: Mode,
    #[serde(default)]
    pub trim: Option<String>,
    #[serde(default)]
    pub selectors: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub group_width: Option<i64>,
    /// Required in raw mode
    #[serde(default)]
    pub output_format: Option<String>,
}

impl HtmlRequest {
    fn spec(&self) -> ExtractionSpec {
        ExtractionSpec {
            trim: self.trim.clone(),
            selectors: self.selectors.clone(),
            labels: self.labels.clone(),
            group_width: self.group_width,
        }
    }
}

/// Run a request against already-fetched markup.
pub fn perform_request(html: &str, request: &HtmlRequest) -> Result<Value, ScrapeError> {
    // Reject a bad format before doing any parsing work.
    let format = match request.mode {
        Mode::Raw => Some(
            request
                .output_format
                .as_deref()
                .unwrap_or_default()
                .parse::<OutputFormat>()?,
        ),
        _ => None,
    };

    let document = Document::parse(html);
    let spec = request.spec();

    let value = match (request.mode, format) {
        (Mode::Raw, Some(format)) => match engine::extract_raw(&document, &spec, format)? {
            RawOutput::Html(markup) => json!({ "html": markup }),
            RawOutput::Records(data) => json!({ "data": data }),
        },
        (Mode::Census, _) => json!({ "tags": engine::census(&document, spec.trim.as_deref())? }),
        _ => json!({ "data": engine::extract(&document, &spec)? }),
    };
    Ok(value)
}

/// Extract records (or a census) from HTML according to a JSON request.
///
/// # Arguments
/// * `html_ptr` - Pointer to HTML content (UTF-8, not necessarily null-terminated)
/// * `html_len` - Length of HTML content in bytes
/// * `request_json` - JSON-serialized [`HtmlRequest`] (null-terminated)
///
/// # Returns
/// ExtractionResultFFI with either json_ptr set (success) or error_ptr set (failure)
///
/// # Safety
/// - `html_ptr` must point to valid memory of at least `html_len` bytes
/// - `request_json` must be a valid null-terminated C string
/// - Caller must free the result via `free_extraction_result`
#[no_mangle]
pub unsafe extern "C" fn extract_from_html(
    html_ptr: *const c_char,
    html_len: usize,
    request_json: *const c_char,
) -> ExtractionResultFFI {
    let html = if html_ptr.is_null() || html_len == 0 {
        String::new()
    } else {
        let slice = std::slice::from_raw_parts(html_ptr as *const u8, html_len);
        match std::str::from_utf8(slice) {
            Ok(s) => s.to_string(),
            Err(_) => return make_error_result("Invalid UTF-8 in HTML content"),
        }
    };

    if request_json.is_null() {
        return make_error_result("Request JSON is null");
    }
    let request_str = match CStr::from_ptr(request_json).to_str() {
        Ok(s) => s,
        Err(_) => return make_error_result("Invalid UTF-8 in request JSON"),
    };

    let request: HtmlRequest = match serde_json::from_str(request_str) {
        Ok(r) => r,
        Err(e) => return make_error_result(&format!("Failed to parse request JSON: {}", e)),
    };

    let value = match perform_request(&html, &request) {
        Ok(v) => v,
        Err(e) => return make_error_result(&e.to_string()),
    };

    match serde_json::to_string(&value) {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => ExtractionResultFFI {
                json_ptr: cstr.into_raw(),
                error_ptr: ptr::null_mut(),
            },
            Err(_) => make_error_result("Result JSON contains null bytes"),
        },
        Err(e) => make_error_result(&format!("Failed to serialize result: {}", e)),
    }
}

/// Free an ExtractionResultFFI returned by extract_from_html
///
/// # Safety
/// - `result` must have been returned by `extract_from_html`
/// - Must only be called once per result
#[no_mangle]
pub unsafe extern "C" fn free_extraction_result(result: ExtractionResultFFI) {
    if !result.json_ptr.is_null() {
        drop(CString::from_raw(result.json_ptr));
    }
    if !result.error_ptr.is_null() {
        drop(CString::from_raw(result.error_ptr));
    }
}

fn make_error_result(msg: &str) -> ExtractionResultFFI {
    let error_ptr = CString::new(msg.replace('\0', " "))
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut());
    ExtractionResultFFI {
        json_ptr: ptr::null_mut(),
        error_ptr,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<table><tr><td>a</td><td>1</td></tr><tr><td>b</td></tr></table>";

    fn call(html: &str, request: &str) -> Result<Value, String> {
        let request = CString::new(request).unwrap();
        unsafe {
            let result = extract_from_html(html.as_ptr() as *const c_char, html.len(), request.as_ptr());
            let out = if result.error_ptr.is_null() {
                let json = CStr::from_ptr(result.json_ptr).to_str().unwrap();
                Ok(serde_json::from_str(json).unwrap())
            } else {
                Err(CStr::from_ptr(result.error_ptr).to_string_lossy().into_owned())
            };
            free_extraction_result(result);
            out
        }
    }

    #[test]
    fn test_simple_mode() {
        let out = call(HTML, r#"{"mode":"simple","selectors":["<td>"],"labels":["k","v"]}"#).unwrap();
        assert_eq!(out, json!({"data": [{"k": "a", "v": "1"}, {"k": "b"}]}));
    }

    #[test]
    fn test_raw_mode() {
        let out = call(
            HTML,
            r#"{"mode":"raw","selectors":["<tr><td>"],"labels":["k","v"],"output_format":"json"}"#,
        )
        .unwrap();
        assert_eq!(out, json!({"data": [{"k": "a", "v": "1"}]}));
    }

    #[test]
    fn test_raw_html_mode() {
        let out = call(HTML, r#"{"mode":"raw","trim":"<tr>","output_format":"html"}"#).unwrap();
        assert_eq!(out, json!({"html": "<tr><td>a</td><td>1</td></tr>"}));
    }

    #[test]
    fn test_census_mode() {
        let out = call(HTML, r#"{"mode":"census","trim":"<tr>"}"#).unwrap();
        assert_eq!(
            out,
            json!({"tags": [
                {"tag": "<tr>", "count": 1, "example_output": "a1"},
                {"tag": "<tr><td>", "count": 2, "example_output": "a"}
            ]})
        );
    }

    #[test]
    fn test_errors_are_reported() {
        let err = call(HTML, r#"{"mode":"simple","trim":"<ul>","selectors":["<td>"]}"#).unwrap_err();
        assert!(err.contains("Trim tag not found"));

        let err = call(HTML, r#"{"mode":"raw","selectors":["<td>"]}"#).unwrap_err();
        assert!(err.contains("output_format"));

        let err = call(HTML, "not json").unwrap_err();
        assert!(err.starts_with("Failed to parse request JSON"));
    }

    #[test]
    fn test_null_request() {
        unsafe {
            let result = extract_from_html(ptr::null(), 0, ptr::null());
            assert!(result.json_ptr.is_null());
            assert!(!result.error_ptr.is_null());
            free_extraction_result(result);
        }
    }
}
