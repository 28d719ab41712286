//! HTML bodies served by the route handlers.
//!
//! The pages are deliberately plain: a title, a heading, optional navigation
//! links and either a list of files or a single-field upload form.  Every
//! filename is HTML-escaped for display and percent-encoded per path segment
//! inside `href` attributes.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use skynet_core::ServiceMode;

use super::storage::ListingEntry;

/// Characters escaped inside one path segment of a `/download/...` link.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'\'')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Path of the upload form (and POST target) for `mode`.
pub fn upload_path(mode: ServiceMode) -> &'static str {
    match mode {
        ServiceMode::Combined => "/upload-service",
        _ => "/",
    }
}

/// Path of the root directory listing for `mode`.
pub fn listing_path(mode: ServiceMode) -> &'static str {
    match mode {
        ServiceMode::Combined => "/download-service",
        _ => "/",
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// `/download/<relative>/<name>` with every segment percent-encoded.
pub fn download_href(relative: &str, name: &str) -> String {
    let mut href = String::from("/download");
    for segment in relative.split('/').filter(|s| !s.is_empty()).chain([name]) {
        href.push('/');
        href.extend(utf8_percent_encode(segment, SEGMENT));
    }
    href
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n{body}</body>\n</html>\n"
    )
}

/// Landing page installed at `/` in combined mode.
pub fn landing_page() -> String {
    document(
        "File Service",
        "<h1>Welcome to the File Service</h1>\n\
         <a href=\"/upload-service\">File Upload</a><br>\n\
         <a href=\"/download-service\">File Download</a>\n",
    )
}

/// The single-field upload form for `mode`.
pub fn upload_form(mode: ServiceMode) -> String {
    let mut body = String::from("<h1>File Upload</h1>\n");
    if mode == ServiceMode::Combined {
        body.push_str(
            "<a href=\"/\">Back to Main Page</a>\n\
             <a href=\"/download-service\">Go to Download Page</a>\n",
        );
    }
    body.push_str(&format!(
        "<hr>\n<form action=\"{}\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\">\n\
         <input type=\"submit\" value=\"Upload\">\n\
         </form>\n",
        upload_path(mode)
    ));
    document("Upload", &body)
}

/// Directory listing.  `relative` is the directory's path below the serving
/// root (`""` for the root itself).
pub fn listing_page(mode: ServiceMode, relative: &str, entries: &[ListingEntry]) -> String {
    let heading = if relative.is_empty() {
        "File Download".to_string()
    } else {
        format!("Index of /{}", escape_html(relative))
    };

    let mut body = format!("<h1>{heading}</h1>\n");
    if mode == ServiceMode::Combined {
        body.push_str(
            "<a href=\"/\">Back to Main Page</a>\n\
             <a href=\"/upload-service\">Go to Upload Page</a>\n",
        );
    }
    body.push_str("<hr>\n<ul>\n");

    if !relative.is_empty() {
        let parent = match relative.rsplit_once('/') {
            // An empty name leaves the trailing slash: `/download/<parent>/`.
            Some((parent, _)) => download_href(parent, ""),
            None => listing_path(mode).to_string(),
        };
        body.push_str(&format!("<li><a href=\"{parent}\">../</a></li>\n"));
    }

    for entry in entries {
        let suffix = if entry.is_dir { "/" } else { "" };
        body.push_str(&format!(
            "<li><a href=\"{}{suffix}\">{}{suffix}</a></li>\n",
            download_href(relative, &entry.name),
            escape_html(&entry.name),
        ));
    }
    body.push_str("</ul>\n");

    document("Download", &body)
}

/// Notice returned after a successful upload: an alert naming the stored
/// file followed by a redirect to `redirect`.
pub fn upload_success(stored_name: &str, redirect: &str) -> String {
    let message = format!("File uploaded successfully\n{stored_name}");
    // A JSON string is a valid JS string literal; `<` is escaped as well so a
    // filename cannot close the script element.
    let literal = serde_json::Value::String(message)
        .to_string()
        .replace('<', "\\u003c");
    format!(
        "<script>\nalert({literal});\nwindow.location.href = '{redirect}';\n</script>\n"
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> ListingEntry {
        ListingEntry {
            name: name.to_string(),
            is_dir: false,
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>&'\""), "&lt;b&gt;&amp;&#39;&quot;");
        assert_eq!(escape_html("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_download_href_encodes_each_segment() {
        assert_eq!(download_href("", "a.txt"), "/download/a.txt");
        assert_eq!(
            download_href("my docs", "r&d #1.pdf"),
            "/download/my%20docs/r&d%20%231.pdf"
        );
        assert_eq!(download_href("a/b", "c?.txt"), "/download/a/b/c%3F.txt");
    }

    #[test]
    fn test_upload_form_targets_mode_path() {
        assert!(upload_form(ServiceMode::Upload).contains("action=\"/\""));
        assert!(upload_form(ServiceMode::Combined).contains("action=\"/upload-service\""));
        assert!(upload_form(ServiceMode::Upload).contains("name=\"file\""));
    }

    #[test]
    fn test_combined_pages_link_to_each_other() {
        let form = upload_form(ServiceMode::Combined);
        let listing = listing_page(ServiceMode::Combined, "", &[]);

        assert!(form.contains("href=\"/download-service\""));
        assert!(listing.contains("href=\"/upload-service\""));
        assert!(!upload_form(ServiceMode::Upload).contains("/download-service"));
    }

    #[test]
    fn test_listing_escapes_names_and_marks_directories() {
        let entries = vec![
            ListingEntry {
                name: "pics".into(),
                is_dir: true,
            },
            file("<x>.txt"),
        ];

        let html = listing_page(ServiceMode::Download, "", &entries);

        assert!(html.contains("<a href=\"/download/pics/\">pics/</a>"));
        assert!(html.contains("<a href=\"/download/%3Cx%3E.txt\">&lt;x&gt;.txt</a>"));
    }

    #[test]
    fn test_subdirectory_listing_links_to_parent() {
        let nested = listing_page(ServiceMode::Download, "a/b", &[file("c.txt")]);
        let top = listing_page(ServiceMode::Combined, "a", &[]);

        assert!(nested.contains("Index of /a/b"));
        assert!(nested.contains("<a href=\"/download/a/\">../</a>"));
        assert!(nested.contains("href=\"/download/a/b/c.txt\""));
        assert!(top.contains("<a href=\"/download-service\">../</a>"));
    }

    #[test]
    fn test_upload_success_names_file_and_redirects() {
        let html = upload_success("report.pdf", "/upload-service");

        assert!(html.contains("File uploaded successfully\\nreport.pdf"));
        assert!(html.contains("window.location.href = '/upload-service'"));
    }

    #[test]
    fn test_upload_success_cannot_close_script() {
        let html = upload_success("</script><b>.txt", "/");

        assert_eq!(html.matches("</script>").count(), 1);
    }
}
