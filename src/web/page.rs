/// Editor page rendering.
///
/// The page template carries `{{name}}` placeholders that are filled in a
/// single pass, so document text that happens to contain `{{...}}` is never
/// expanded.
use serde_json::json;

use crate::annotation::AnnotationSet;
use crate::config::Config;
use crate::palette::Palette;
use crate::render::{escape_html, render_html};
use crate::store::{DocumentListing, LoadedDocument};

const TEMPLATE: &str = include_str!("index.html");

pub fn render_page(
    config: &Config,
    palette: &Palette,
    listing: &DocumentListing,
    document: &LoadedDocument,
) -> String {
    let annotations = AnnotationSet::from_spans(document.annotations.clone());

    fill_template(TEMPLATE, |key| {
        let value = match key {
            "title" => escape_html(&config.title),
            // Style values go into a <style> element, which is raw text.
            "file_list_width" => config.ui.file_list_width.clone(),
            "annotation_area_width" => config.ui.annotation_area_width.clone(),
            "body_font" => config.ui.body_font.clone(),
            "code_font" => config.ui.code_font.clone(),
            "file_items" => file_items(listing, &document.file),
            "current_heading" => current_heading(&document.file),
            "class_buttons" => class_buttons(palette),
            "text_html" => render_html(&document.text, &annotations, palette),
            "state_json" => state_json(config, palette, document),
            _ => return None,
        };
        Some(value)
    })
}

/// Replace every `{{key}}` for which `lookup` returns a value.
fn fill_template(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len() * 2);
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let key = after[..close].trim();
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn file_items(listing: &DocumentListing, current: &str) -> String {
    let mut html = String::new();
    for file in &listing.files {
        let annotated = listing.is_annotated(file);
        let mut classes = String::from("file-item");
        if file == current {
            classes.push_str(" current");
        }
        if annotated {
            classes.push_str(" annotated");
        }
        let name = escape_html(file);
        let mark = if annotated { " ✓" } else { "" };
        html.push_str(&format!(
            "<div class=\"{classes}\" data-file=\"{name}\">{name}{mark}</div>\n"
        ));
    }
    html
}

fn current_heading(current: &str) -> String {
    if current.is_empty() {
        "Select a file to annotate".to_string()
    } else {
        format!("Current File: {}", escape_html(current))
    }
}

fn class_buttons(palette: &Palette) -> String {
    palette
        .entries()
        .iter()
        .map(|entry| {
            format!(
                "<button class=\"class-button\" data-class=\"{name}\" \
                 style=\"background-color: {bg}; color: {fg}\">{name}</button>",
                name = escape_html(&entry.name),
                bg = escape_html(&entry.bg),
                fg = escape_html(&entry.text),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Initial client state, embedded as a JSON data block.
///
/// The raw text travels here as well: the editor counts offsets over it,
/// since parsing `text_html` folds `\r\n` into `\n`.
fn state_json(config: &Config, palette: &Palette, document: &LoadedDocument) -> String {
    let state = json!({
        "file": document.file,
        "text": document.text,
        "annotations": document.annotations,
        "classes": palette.entries(),
        "fallback": palette.fallback(),
        "autoSaveIntervalMs": config.auto_save_interval_ms,
    });
    // `<` never appears outside strings in JSON, so this cannot end the
    // script block early and stays valid JSON.
    state.to_string().replace('<', "\\u003c")
}
