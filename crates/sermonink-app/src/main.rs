//! Command-line entry point (native).

#[cfg(feature = "native")]
fn main() {
    use sermonink_app::Session;
    use sermonink_core::config::EditorConfig;
    use sermonink_core::layout::FixedPitchLayout;
    use sermonink_core::storage::FileStorage;
    use std::sync::Arc;

    sermonink_app::init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("list");

    let storage = match FileStorage::default_location() {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    log::info!("Using notes in {}", storage.base_path().display());

    let opened = pollster::block_on(Session::open(
        storage,
        EditorConfig::default(),
        Box::new(FixedPitchLayout::default()),
    ));
    let mut session = match opened {
        Ok(session) => session,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let result = match command {
        "list" => {
            for note in session.presentation_order() {
                println!("{}  {}  {}  ({} pages)", note.date, note.id, note.title, note.pages.page_count());
            }
            Ok(())
        }
        "options" => {
            use sermonink_core::constants::{
                FONT_FAMILIES, FONT_SIZES, PEN_COLORS, PEN_THICKNESSES, SERVICE_TYPES,
            };
            use sermonink_core::stroke::Tool;

            let tools: Vec<&str> = Tool::all().iter().map(Tool::name).collect();
            let sizes: Vec<String> = FONT_SIZES.iter().map(|size| format!("{}px", size)).collect();
            let colors: Vec<String> = PEN_COLORS
                .iter()
                .map(|(label, css)| format!("{} {}", label, css))
                .collect();
            let widths: Vec<String> = PEN_THICKNESSES.iter().map(u32::to_string).collect();

            println!("Fonts: {}", FONT_FAMILIES.join(", "));
            println!("Font sizes: {}", sizes.join(", "));
            println!("Service types: {}", SERVICE_TYPES.join(", "));
            println!("Tools: {}", tools.join(", "));
            println!("Pen colors: {}", colors.join(", "));
            println!("Pen widths: {}", widths.join(", "));
            Ok(())
        }
        "search" => {
            let query = args.get(1).map(String::as_str).unwrap_or("");
            for note in session.search(query) {
                println!("{}  {}  {}", note.date, note.id, note.title);
            }
            Ok(())
        }
        "export" => session.export().map_err(|e| e.to_string()).and_then(|backup| {
            let path = args.get(1).cloned().unwrap_or(backup.file_name);
            std::fs::write(&path, backup.json)
                .map(|_| println!("Wrote {}", path))
                .map_err(|e| format!("Failed to write {}: {}", path, e))
        }),
        "import" => match args.get(1) {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path, e))
                .and_then(|json| session.import(&json).map_err(|e| e.to_string()))
                .map(|count| {
                    pollster::block_on(session.persist());
                    println!("Imported {} notes", count);
                }),
            None => Err("usage: sermonink import <file>".to_string()),
        },
        other => Err(format!("Unknown command '{}'. Commands: list, search, options, export, import", other)),
    };

    if let Err(message) = result {
        eprintln!("{}", message);
        std::process::exit(1);
    }

    pollster::block_on(session.persist());
}

#[cfg(not(feature = "native"))]
fn main() {
    eprintln!("Native feature not enabled. Use `cargo run --features native`");
}
