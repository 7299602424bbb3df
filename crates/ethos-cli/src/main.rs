//! Ethos CLI - Inspect and edit saved Ethos documents

mod config;

use anyhow::{bail, Context, Result};
use ethos_core::{CvLayout, Mode, Position, Selection, TemplateKey};
use ethos_editor::{Editor, EditorEvent, EventStream};
use ethos_store::TemplateLibrary;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::StoreConfig;

const DEFAULT_SHARE_BASE: &str = "https://ethos.app/editor";

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ethos=info".parse()?))
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "help" | "--help" | "-h" => print_help(),
        "show" => {
            if args.len() < 3 {
                eprintln!("Usage: ethos-cli show <template>");
                return Ok(());
            }
            show(&args[2])?;
        }
        "words" => {
            if args.len() < 3 {
                eprintln!("Usage: ethos-cli words <template>");
                return Ok(());
            }
            words(&args[2])?;
        }
        "import" => {
            if args.len() < 4 {
                eprintln!("Usage: ethos-cli import <template> <file>");
                return Ok(());
            }
            import(&args[2], &args[3])?;
        }
        "table" => {
            if args.len() < 5 {
                eprintln!("Usage: ethos-cli table <template> <rows> <cols>");
                return Ok(());
            }
            table(&args[2], &args[3], &args[4])?;
        }
        "share" => {
            if args.len() < 3 {
                eprintln!("Usage: ethos-cli share <template> [base-url]");
                return Ok(());
            }
            share(&args[2], args.get(3).map(String::as_str))?;
        }
        "open" => {
            if args.len() < 4 {
                eprintln!("Usage: ethos-cli open <template> <share-url>");
                return Ok(());
            }
            open(&args[2], &args[3])?;
        }
        "templates" => list_templates()?,
        "add-template" => {
            if args.len() < 4 {
                eprintln!("Usage: ethos-cli add-template <title> <font> [description]");
                return Ok(());
            }
            add_template(&args[2], &args[3], args.get(4).map(String::as_str).unwrap_or(""))?;
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_help();
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"Ethos CLI - Document editor engine

USAGE:
    ethos-cli <COMMAND> [OPTIONS]

TEMPLATES:
    academic, homework, report, none, cv:<layout>, custom[:<id>]
    CV layouts: modern, classic, minimal, executive, creative

COMMANDS:
    help            Show this help message
    show            Print a saved document
    words           Count the words of a saved document
    import          Replace a document with markup read from a file
    table           Append an empty table to a document
    share           Print a share link for a document
    open            Save the document carried by a share link
    templates       List custom templates
    add-template    Add a custom template

ENVIRONMENT:
    ETHOS_DATA_DIR  Data directory (defaults to the platform data directory)

EXAMPLES:
    ethos-cli import academic ./draft.html
    ethos-cli table cv:modern 3 2
    ethos-cli share report
    ethos-cli open academic "https://ethos.app/editor?data=PHA-aGk8L3A-"
"#
    );
}

/// Parse `mode` or `mode:variant`
fn parse_template(arg: &str) -> Result<TemplateKey> {
    let (mode, variant) = match arg.split_once(':') {
        Some((mode, variant)) => (mode, Some(variant)),
        None => (arg, None),
    };
    let mode: Mode = mode.parse()?;
    match (mode, variant) {
        (Mode::Cv, variant) => {
            let layout: CvLayout = match variant {
                Some(layout) => layout.parse()?,
                None => CvLayout::default(),
            };
            Ok(TemplateKey::cv(layout))
        }
        (Mode::Custom, Some(id)) => {
            let id: uuid::Uuid = id.parse().context("Custom template ids are UUIDs")?;
            Ok(TemplateKey::with_variant(Mode::Custom, id.to_string()))
        }
        (mode, None) => Ok(TemplateKey::new(mode)),
        (mode, Some(_)) => bail!("Mode '{}' has no variants", mode),
    }
}

/// Open an editor on the saved document for `template`
fn session(template: &str) -> Result<(Editor, EventStream)> {
    let key = parse_template(template)?;
    let config = StoreConfig::from_env()?;
    let store = config.open_store()?;
    let (mut editor, events) = Editor::new(config.editor_config()?, Box::new(store));
    editor.open(key, None)?;
    Ok((editor, events))
}

/// Put the caret after the last top-level node
fn caret_at_end(editor: &mut Editor) {
    let doc = editor.document();
    let end = Position::new(doc.root(), doc.children(doc.root()).len());
    editor.set_selection(Some(Selection::caret(end)));
}

fn print_notices(events: &EventStream) {
    for event in events.drain() {
        if let EditorEvent::Notice(notice) = event {
            println!("{}", notice);
        }
    }
}

fn show(template: &str) -> Result<()> {
    let (editor, _events) = session(template)?;
    let html = editor.get_html();
    if html.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", html);
    }
    Ok(())
}

fn words(template: &str) -> Result<()> {
    let (editor, _events) = session(template)?;
    println!("{}", editor.word_count());
    Ok(())
}

fn import(template: &str, file: &str) -> Result<()> {
    let markup =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?;
    let (mut editor, events) = session(template)?;
    editor.replace_content(&markup);
    editor.save()?;
    print_notices(&events);
    println!("Imported {} words into {}", editor.word_count(), editor.template_key());
    Ok(())
}

fn table(template: &str, rows: &str, cols: &str) -> Result<()> {
    let rows: usize = rows.parse().context("Rows must be a number")?;
    let cols: usize = cols.parse().context("Columns must be a number")?;
    let (mut editor, events) = session(template)?;
    caret_at_end(&mut editor);
    editor.insert_table(rows, cols)?;
    editor.save()?;
    print_notices(&events);
    Ok(())
}

fn share(template: &str, base: Option<&str>) -> Result<()> {
    let base = Url::parse(base.unwrap_or(DEFAULT_SHARE_BASE)).context("Invalid base URL")?;
    let (editor, _events) = session(template)?;
    println!("{}", editor.share_url(&base));
    Ok(())
}

fn open(template: &str, link: &str) -> Result<()> {
    let mut url = Url::parse(link).context("Invalid share link")?;
    let key = parse_template(template)?;
    let config = StoreConfig::from_env()?;
    let (mut editor, events) = Editor::new(config.editor_config()?, Box::new(config.open_store()?));

    let source = editor.open_url(key, &mut url)?;
    editor.save()?;
    print_notices(&events);
    println!(
        "Loaded {} from {:?} ({} words)",
        editor.template_key(),
        source,
        editor.word_count()
    );
    Ok(())
}

fn list_templates() -> Result<()> {
    let store = StoreConfig::from_env()?.open_store()?;
    let library = TemplateLibrary::load(&store)?;

    if library.is_empty() {
        println!("No custom templates");
    } else {
        println!("Custom templates:");
        for template in library.iter() {
            println!("  {} - {} ({})", template.id, template.title, template.font);
        }
    }
    Ok(())
}

fn add_template(title: &str, font: &str, description: &str) -> Result<()> {
    let mut store = StoreConfig::from_env()?.open_store()?;
    let mut library = TemplateLibrary::load(&store)?;
    let id = library.add(title, font, description).id;
    library.save(&mut store)?;
    println!("Added template: {}", id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_template() {
        assert_eq!(
            parse_template("academic").unwrap(),
            TemplateKey::new(Mode::Academic)
        );
        assert_eq!(
            parse_template("cv:executive").unwrap(),
            TemplateKey::cv(CvLayout::Executive)
        );
        assert_eq!(parse_template("cv").unwrap(), TemplateKey::cv(CvLayout::Modern));

        let id = uuid::Uuid::new_v4();
        assert_eq!(
            parse_template(&format!("custom:{}", id)).unwrap().storage_key(),
            format!("custom_{}", id)
        );
    }

    #[test]
    fn test_parse_bare_custom() {
        let key = parse_template("custom").unwrap();
        assert_eq!(key, TemplateKey::new(Mode::Custom));
        assert_eq!(key.storage_key(), "custom_");
        assert!(parse_template("custom:not-a-uuid").is_err());
    }

    #[test]
    fn test_parse_template_rejects() {
        assert!(parse_template("poetry").is_err());
        assert!(parse_template("report:weekly").is_err());
        assert!(parse_template("cv:baroque").is_err());
    }
}
