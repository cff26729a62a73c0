//! FFI layer for mobile and desktop hosts.
//!
//! This module provides C-compatible functions over the pure engine
//! operations. Records cross the boundary as JSON arrays of [`JsonRecord`]
//! objects, so any entity shape works.
//!
//! # Memory Management
//!
//! - Strings returned by `wordsync_*` functions are allocated by Rust
//! - Caller must free them with `wordsync_string_free`
//!
//! # Error Handling
//!
//! Functions return JSON with either:
//! - `{"ok": <result>}` on success
//! - `{"error": "<message>"}` on failure
//!
//! The batcher is not exported: its remote call is async and belongs to the
//! host. Hosts push the chunks from `wordsync_chunk` themselves.

use crate::{
    find_changed_items, find_latest_updated_at, format_timestamp, get_unsynced_items,
    merge_local_and_server, update_local_items, Batcher, JsonRecord, SyncResult,
};
use serde::de::DeserializeOwned;
use std::ffi::{c_char, CStr, CString};

/// Result wrapper for FFI responses.
#[derive(serde::Serialize)]
#[serde(untagged)]
enum FfiResult<T: serde::Serialize> {
    Ok { ok: T },
    Err { error: String },
}

impl<T: serde::Serialize> FfiResult<T> {
    fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {}"}}"#, e))
    }
}

/// Convert a Rust string to a C string pointer.
/// Caller must free with `wordsync_string_free`.
fn to_c_string(s: String) -> *mut c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => CString::new(r#"{"error":"string contained null bytes"}"#)
            .unwrap_or_default()
            .into_raw(),
    }
}

/// Convert a C string pointer to a Rust string.
/// Returns None if pointer is null or invalid UTF-8.
unsafe fn from_c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Read and parse a JSON argument.
unsafe fn parse_arg<T: DeserializeOwned>(ptr: *const c_char, name: &str) -> Result<T, String> {
    let raw = from_c_string(ptr).ok_or_else(|| format!("invalid {} JSON", name))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse error in {}: {}", name, e))
}

/// Run `f` and encode its outcome as a response string.
fn respond<T: serde::Serialize>(f: impl FnOnce() -> Result<T, String>) -> *mut c_char {
    let result = match f() {
        Ok(ok) => FfiResult::Ok { ok },
        Err(error) => FfiResult::Err { error },
    };
    to_c_string(result.to_json())
}

/// Free a string allocated by the engine.
///
/// # Safety
/// - `s` must be a valid pointer from a `wordsync_*` function
/// - Must not be called twice on the same pointer
#[no_mangle]
pub unsafe extern "C" fn wordsync_string_free(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Merge a local replica with a server replica.
///
/// # Returns
/// JSON string: `{"ok": [JsonRecord]}` or `{"error": "message"}`
///
/// # Safety
/// - `local_json` and `server_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_merge_local_and_server(
    local_json: *const c_char,
    server_json: *const c_char,
) -> *mut c_char {
    respond(|| {
        let local: Vec<JsonRecord> = parse_arg(local_json, "local")?;
        let server: Vec<JsonRecord> = parse_arg(server_json, "server")?;
        Ok(merge_local_and_server(&local, &server))
    })
}

/// Records of the final snapshot whose sync metadata changed.
///
/// # Returns
/// JSON string: `{"ok": [JsonRecord]}` or `{"error": "message"}`
///
/// # Safety
/// - `original_json` and `final_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_find_changed_items(
    original_json: *const c_char,
    final_json: *const c_char,
) -> *mut c_char {
    respond(|| {
        let original: Vec<JsonRecord> = parse_arg(original_json, "original")?;
        let final_items: Vec<JsonRecord> = parse_arg(final_json, "final")?;
        Ok(find_changed_items(&original, &final_items))
    })
}

/// Apply server acknowledgements to a local replica.
///
/// # Arguments
/// - `local_json`: JSON array of JsonRecord
/// - `results_json`: JSON array of `{"id", "updatedAt"}`
///
/// # Returns
/// JSON string: `{"ok": [JsonRecord]}` or `{"error": "message"}`
///
/// # Safety
/// - `local_json` and `results_json` must be valid null-terminated C strings or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_update_local_items(
    local_json: *const c_char,
    results_json: *const c_char,
) -> *mut c_char {
    respond(|| {
        let local: Vec<JsonRecord> = parse_arg(local_json, "local")?;
        let results: Vec<SyncResult> = parse_arg(results_json, "results")?;
        Ok(update_local_items(&local, &results))
    })
}

/// Records awaiting acknowledgement.
///
/// # Returns
/// JSON string: `{"ok": [JsonRecord]}` or `{"error": "message"}`
///
/// # Safety
/// - `items_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_get_unsynced_items(items_json: *const c_char) -> *mut c_char {
    respond(|| {
        let items: Vec<JsonRecord> = parse_arg(items_json, "items")?;
        Ok(get_unsynced_items(&items))
    })
}

/// Watermark of a replica.
///
/// # Returns
/// JSON string: `{"ok": "<RFC 3339 timestamp>"}` or `{"error": "message"}`.
/// An empty replica yields the Unix epoch.
///
/// # Safety
/// - `items_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_find_latest_updated_at(
    items_json: *const c_char,
) -> *mut c_char {
    respond(|| {
        let items: Vec<JsonRecord> = parse_arg(items_json, "items")?;
        Ok(format_timestamp(&find_latest_updated_at(&items)))
    })
}

// ============================================================================
// Batching
// ============================================================================

/// Split records into the chunks a push would send.
///
/// # Returns
/// JSON string: `{"ok": [[JsonRecord]]}` or `{"error": "message"}`
///
/// # Safety
/// - `items_json` must be a valid null-terminated C string or null
/// - Caller must free the returned string with `wordsync_string_free`
#[no_mangle]
pub unsafe extern "C" fn wordsync_chunk(items_json: *const c_char, batch_size: usize) -> *mut c_char {
    respond(|| {
        let batcher = Batcher::new(batch_size).map_err(|e| e.to_string())?;
        let items: Vec<JsonRecord> = parse_arg(items_json, "items")?;
        Ok(batcher
            .chunks(&items)
            .map(<[JsonRecord]>::to_vec)
            .collect::<Vec<_>>())
    })
}

// ============================================================================
// Utility
// ============================================================================

/// Get the engine version.
///
/// # Returns
/// Static string pointer (do not free)
#[no_mangle]
pub extern "C" fn wordsync_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Get the default batch size.
#[no_mangle]
pub extern "C" fn wordsync_default_batch_size() -> usize {
    crate::DEFAULT_BATCH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::ptr;

    fn c_json(value: Value) -> CString {
        CString::new(value.to_string()).unwrap()
    }

    /// Read and free a response string.
    unsafe fn take(response: *mut c_char) -> Value {
        let text = CStr::from_ptr(response).to_str().unwrap().to_string();
        wordsync_string_free(response);
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn ffi_merge() {
        let local = c_json(json!([{
            "id": "a",
            "synced": false,
            "updatedAt": "2024-01-01T00:00:00Z",
            "locallyUpdatedAt": "2024-01-02T00:00:00Z",
            "word": "local"
        }]));
        let server = c_json(json!([
            {"id": "a", "updatedAt": "2024-01-03T00:00:00Z", "word": "server"},
            {"id": "b", "updatedAt": "2024-01-01T00:00:00Z", "word": "new"}
        ]));

        let response = unsafe {
            take(wordsync_merge_local_and_server(
                local.as_ptr(),
                server.as_ptr(),
            ))
        };

        assert_eq!(
            response,
            json!({"ok": [
                {
                    "id": "a",
                    "synced": true,
                    "updatedAt": "2024-01-03T00:00:00Z",
                    "locallyUpdatedAt": "2024-01-03T00:00:00Z",
                    "word": "server"
                },
                {
                    "id": "b",
                    "synced": true,
                    "updatedAt": "2024-01-01T00:00:00Z",
                    "locallyUpdatedAt": "2024-01-01T00:00:00Z",
                    "word": "new"
                }
            ]})
        );
    }

    #[test]
    fn ffi_update_and_changed() {
        let local = json!([
            {"id": "a", "synced": false, "locallyUpdatedAt": "2024-01-02T00:00:00Z"},
            {"id": "b", "synced": false, "locallyUpdatedAt": "2024-01-02T00:00:00Z"}
        ]);
        let results = c_json(json!([{"id": "b", "updatedAt": "2024-01-04T00:00:00Z"}]));
        let local_c = c_json(local.clone());

        let updated = unsafe {
            take(wordsync_update_local_items(
                local_c.as_ptr(),
                results.as_ptr(),
            ))
        };
        assert_eq!(updated["ok"][0]["synced"], false);
        assert_eq!(updated["ok"][1]["synced"], true);

        let final_c = c_json(updated["ok"].clone());
        let changed = unsafe { take(wordsync_find_changed_items(local_c.as_ptr(), final_c.as_ptr())) };
        assert_eq!(changed["ok"].as_array().unwrap().len(), 1);
        assert_eq!(changed["ok"][0]["id"], "b");

        let unsynced = unsafe { take(wordsync_get_unsynced_items(final_c.as_ptr())) };
        assert_eq!(unsynced["ok"][0]["id"], "a");
        assert_eq!(unsynced["ok"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn ffi_watermark() {
        let items = c_json(json!([
            {"id": "a", "synced": true, "updatedAt": "2024-01-03T00:00:00Z",
             "locallyUpdatedAt": "2024-01-03T00:00:00Z"},
            {"id": "b", "synced": false, "locallyUpdatedAt": "2024-01-05T12:00:00Z"}
        ]));
        let response = unsafe { take(wordsync_find_latest_updated_at(items.as_ptr())) };
        assert_eq!(response, json!({"ok": "2024-01-05T12:00:00Z"}));

        let empty = c_json(json!([]));
        let response = unsafe { take(wordsync_find_latest_updated_at(empty.as_ptr())) };
        assert_eq!(response, json!({"ok": "1970-01-01T00:00:00Z"}));
    }

    #[test]
    fn ffi_chunk() {
        let items: Vec<Value> = (0..5)
            .map(|i| json!({"id": format!("r{}", i), "locallyUpdatedAt": "2024-01-01T00:00:00Z"}))
            .collect();
        let items = c_json(Value::Array(items));

        let response = unsafe { take(wordsync_chunk(items.as_ptr(), 2)) };
        let sizes: Vec<usize> = response["ok"]
            .as_array()
            .unwrap()
            .iter()
            .map(|chunk| chunk.as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let response = unsafe { take(wordsync_chunk(items.as_ptr(), 0)) };
        assert!(response["error"].as_str().unwrap().contains("batch size"));
    }

    #[test]
    fn ffi_version() {
        unsafe {
            let version = wordsync_version();
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, env!("CARGO_PKG_VERSION"));
        }
        assert_eq!(wordsync_default_batch_size(), 500);
    }

    #[test]
    fn ffi_error_handling() {
        unsafe {
            // Null pointer
            let response = take(wordsync_get_unsynced_items(ptr::null()));
            assert_eq!(response, json!({"error": "invalid items JSON"}));

            // Invalid JSON
            let invalid = CString::new("not valid json").unwrap();
            let response = take(wordsync_merge_local_and_server(
                invalid.as_ptr(),
                invalid.as_ptr(),
            ));
            assert!(response["error"]
                .as_str()
                .unwrap()
                .starts_with("parse error in local"));
        }
    }
}
