//! Thin wrappers over the playground REST API.

use gloo_net::http::{Request, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;
use wasm_bindgen::JsCast;
use web_types::{ApiError, EditorOpened, ExportRequest, RunRequest, RunResponse};

/// Pull the error message out of a failed response.
async fn failure(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ApiError>().await {
        Ok(body) => body.error,
        Err(_) => format!("request failed with status {status}"),
    }
}

pub async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, String> {
    let resp = Request::get(url).send().await.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(failure(resp).await);
    }
    resp.json::<T>().await.map_err(|e| e.to_string())
}

pub async fn post_json<B: Serialize, T: DeserializeOwned>(url: &str, body: &B) -> Result<T, String> {
    let resp = Request::post(url)
        .json(body)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(failure(resp).await);
    }
    resp.json::<T>().await.map_err(|e| e.to_string())
}

/// Open a server-side editor for this page.
pub async fn open_editor() -> Result<Uuid, String> {
    let resp = Request::post("/api/editors")
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(failure(resp).await);
    }
    let opened = resp.json::<EditorOpened>().await.map_err(|e| e.to_string())?;
    Ok(opened.editor)
}

/// Run the buffers in this page's editor.
///
/// Opens a new editor when there is none yet or the server has closed it.
pub async fn run(editor: Option<Uuid>, request: &RunRequest) -> Result<(Uuid, RunResponse), String> {
    if let Some(editor) = editor
        && let Some(resp) = run_in(editor, request).await?
    {
        return Ok((editor, resp));
    }

    let editor = open_editor().await?;
    match run_in(editor, request).await? {
        Some(resp) => Ok((editor, resp)),
        None => Err("editor closed before it could run".to_string()),
    }
}

/// `None` when the editor is gone.
async fn run_in(editor: Uuid, request: &RunRequest) -> Result<Option<RunResponse>, String> {
    let resp = Request::post(&format!("/api/editors/{editor}/run"))
        .json(request)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if resp.status() == 404 {
        return Ok(None);
    }
    if !resp.ok() {
        return Err(failure(resp).await);
    }
    resp.json::<RunResponse>()
        .await
        .map(Some)
        .map_err(|e| e.to_string())
}

/// A standalone document ready to hand to the browser's download machinery.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub filename: String,
    pub href: String,
}

/// Ask the server for the export document and turn it into a data URL.
pub async fn export(request: &ExportRequest) -> Result<Download, String> {
    let resp = Request::post("/api/export")
        .json(request)
        .map_err(|e| e.to_string())?
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(failure(resp).await);
    }

    let filename = resp
        .headers()
        .get("content-disposition")
        .as_deref()
        .and_then(attachment_filename)
        .unwrap_or_else(|| "untitled.html".to_string());
    let text = resp.text().await.map_err(|e| e.to_string())?;
    let href = format!(
        "data:text/html;charset=utf-8,{}",
        js_sys::encode_uri_component(&text)
    );

    Ok(Download { filename, href })
}

fn attachment_filename(header: &str) -> Option<String> {
    let (_, rest) = header.split_once("filename=")?;
    Some(rest.trim().trim_matches('"').to_string())
}

/// Hand the document to the browser as a file download.
pub fn start_download(download: &Download) -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document available".to_string())?;
    let anchor: web_sys::HtmlAnchorElement = document
        .create_element("a")
        .map_err(|e| format!("{e:?}"))?
        .dyn_into()
        .map_err(|_| "created element is not an anchor".to_string())?;

    anchor.set_href(&download.href);
    anchor.set_download(&download.filename);
    anchor.click();
    Ok(())
}

pub fn log_error(context: &str, message: &str) {
    web_sys::console::error_1(&format!("{context}: {message}").into());
}
