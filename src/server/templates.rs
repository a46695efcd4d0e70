//! HTML templates for the gallery and download pages.

use crate::models::{AlbumKey, ImageRecord};
use crate::utils::{format_size, html_escape};

/// Base HTML template.
pub fn base_template(title: &str, content: &str) -> String {
    let title = html_escape(title);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - albumgrab</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <header id="main-header">
        <nav>
            <a href="/api/cache" class="logo">albumgrab</a>
        </nav>
    </header>
    <main>
        <h1>{}</h1>
        {}
    </main>
</body>
</html>"#,
        title, title, content
    )
}

/// Render an album as an image grid.
pub fn gallery_page(key: &AlbumKey, records: &[ImageRecord]) -> String {
    let mut figures = String::new();
    for record in records {
        let url = html_escape(&record.url);
        figures.push_str(&format!(
            r#"
        <figure>
            <a href="{url}" target="_blank" rel="noreferrer"><img src="{thumb}" alt="{name}" loading="lazy" referrerpolicy="no-referrer"></a>
            <figcaption>{name}</figcaption>
        </figure>"#,
            url = url,
            thumb = html_escape(&record.thumb),
            name = html_escape(&record.name),
        ));
    }

    let content = format!(
        r#"<p class="message">{} images. <a href="/api/bulk-download/{}/{}">Download all</a></p>
    <div class="gallery">{}
    </div>"#,
        records.len(),
        urlencoding::encode(&key.model),
        key.index,
        figures
    );

    base_template(&format!("{} #{}", key.model, key.index), &content)
}

/// Render a message-only page (not found, bad request).
pub fn message_page(title: &str, message: &str) -> String {
    base_template(
        title,
        &format!(r#"<p class="message">{}</p>"#, html_escape(message)),
    )
}

/// Render the downloaded files of a model.
pub fn download_listing(model: &str, files: &[(String, u64)]) -> String {
    let mut rows = String::new();
    for (name, size) in files {
        rows.push_str(&format!(
            r#"
            <tr>
                <td><a href="/downloads/{}/{}">{}</a></td>
                <td>{}</td>
            </tr>"#,
            urlencoding::encode(model),
            urlencoding::encode(name),
            html_escape(name),
            format_size(*size)
        ));
    }

    let content = format!(
        r#"
    <table class="file-listing">
        <thead>
            <tr>
                <th>File</th>
                <th>Size</th>
            </tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>"#,
        rows
    );

    base_template(&format!("Downloads: {}", model), &content)
}
