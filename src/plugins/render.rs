//! Built-in `render` plugin: HTML pages for the site, albums, and images.
//!
//! Pages are compile-time Maud templates rather than user-supplied template
//! files: malformed markup is a build error, interpolation is escaped by
//! default, and there is no template directory to ship. `description` fields
//! at any level are rendered as markdown.
//!
//! Output layout mirrors the writer's target tree:
//!
//! ```text
//! target/
//! ├── index.html                  # site page: album listing
//! ├── landscapes/
//! │   ├── index.html              # album page: image listing
//! │   └── dawn/
//! │       └── index.html          # image page
//! ```
//!
//! The image page embeds the file named by `render.image` (defaulting to the
//! source file's basename, which is what the copy plugin produces).

use super::engine::{HookResult, Plugin};
use super::writer;
use crate::config::Config;
use crate::content::{Album, Image, Site};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use tracing::debug;

pub fn plugin() -> Plugin {
    Plugin::named("render")
        .site(render_site)
        .album(render_album)
        .image(render_image)
}

fn render_site(site: Site, config: &Config) -> HookResult<Site> {
    debug!("Rendering site page");
    let markup = site_page(&site);
    writer::write_root_file(config, "index.html", markup.into_string().as_bytes())?;
    Ok(None)
}

fn render_album(
    album: Album,
    _index: usize,
    _count: usize,
    site: &Site,
    config: &Config,
) -> HookResult<Album> {
    debug!("Rendering album page for {}", album.id);
    let markup = album_page(&album, site);
    writer::write_album_file(config, &album, "index.html", markup.into_string().as_bytes())?;
    Ok(None)
}

fn render_image(
    image: Image,
    _index: usize,
    _count: usize,
    album: &Album,
    site: &Site,
    config: &Config,
) -> HookResult<Image> {
    debug!("Rendering image page for {}/{}", album.id, image.id);
    let basename = image
        .filename
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let image_file: String = config.get_or("render.image", basename)?;

    let markup = image_page(&image, album, site, &image_file);
    writer::write_image_file(
        config,
        album,
        &image,
        "index.html",
        markup.into_string().as_bytes(),
    )?;
    Ok(None)
}

// ============================================================================
// Templates
// ============================================================================

fn site_title(site: &Site) -> &str {
    site.str_field("title").unwrap_or("Gallery")
}

fn page(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body { (body) }
        }
    }
}

fn site_page(site: &Site) -> Markup {
    page(
        site_title(site),
        html! {
            h1 { (site_title(site)) }
            @if let Some(description) = site.str_field("description") {
                div.description { (markdown(description)) }
            }
            ul.albums {
                @for album in &site.albums {
                    li {
                        a href=(format!("{}/", album.id)) { (album.title()) }
                        " (" (album.images.len()) ")"
                    }
                }
            }
        },
    )
}

fn album_page(album: &Album, site: &Site) -> Markup {
    page(
        album.title(),
        html! {
            nav { a href="../" { (site_title(site)) } }
            h1 { (album.title()) }
            @if let Some(description) = album.str_field("description") {
                div.description { (markdown(description)) }
            }
            ul.images {
                @for image in &album.images {
                    li { a href=(format!("{}/", image.id)) { (image.title()) } }
                }
            }
        },
    )
}

fn image_page(image: &Image, album: &Album, site: &Site, image_file: &str) -> Markup {
    page(
        image.title(),
        html! {
            nav {
                a href="../../" { (site_title(site)) }
                " / "
                a href="../" { (album.title()) }
            }
            h1 { (image.title()) }
            img src=(image_file) alt=(image.title());
            @if let Some(caption) = image
                .str_field("description")
                .or_else(|| image.str_field("meta.caption"))
            {
                p.caption { (markdown(caption)) }
            }
        },
    )
}

/// Render a markdown field to inline HTML.
fn markdown(text: &str) -> Markup {
    let parser = pulldown_cmark::Parser::new(text);
    let mut rendered = String::new();
    pulldown_cmark::html::push_html(&mut rendered, parser);
    PreEscaped(rendered)
}
