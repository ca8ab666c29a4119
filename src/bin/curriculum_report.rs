use clap::{Parser, ValueEnum};
use curriculum_etl::config::CURRICULUMS_FILE;
use curriculum_etl::core::report::{
    load_curriculum_file, render_markdown_checklist, render_section_csv, render_section_listing,
    MARKDOWN_FILE, SECTIONS_CSV_FILE,
};
use curriculum_etl::domain::ports::Storage;
use curriculum_etl::utils::logger;
use curriculum_etl::LocalStorage;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Section headings grouped by course ID
    Sections,
    /// Section headings grouped by course ID and title
    Titles,
    /// Markdown checklist written to curriculum_todo.md
    Markdown,
    /// Section listing written to curriculum_sections.csv
    Csv,
}

#[derive(Parser)]
#[command(name = "curriculum-report")]
#[command(about = "Render a saved curriculums.json as text, markdown or CSV")]
struct Args {
    /// Curriculum JSON written by curriculum-etl
    #[arg(short, long, default_value = CURRICULUMS_FILE)]
    input: String,

    /// Directory for markdown/CSV output
    #[arg(long, default_value = ".")]
    output_path: String,

    #[arg(short, long, value_enum, default_value_t = Format::Titles)]
    format: Format,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    // 相對路徑以目前目錄為準，絕對路徑原樣使用
    let input_storage = LocalStorage::new(".".to_string());
    tracing::debug!(
        "📁 Reading curriculum data from: {}",
        input_storage.display_path(&args.input)
    );
    let file = load_curriculum_file(&input_storage, &args.input).await?;
    tracing::info!("📥 Loaded {} course(s)", file.len());

    let storage = LocalStorage::new(args.output_path.clone());

    match args.format {
        Format::Sections => print!("{}", render_section_listing(&file, false)),
        Format::Titles => print!("{}", render_section_listing(&file, true)),
        Format::Markdown => {
            storage
                .write_file(MARKDOWN_FILE, render_markdown_checklist(&file).as_bytes())
                .await?;
            println!(
                "✅ Markdown file '{}' has been created successfully!",
                storage.display_path(MARKDOWN_FILE)
            );
        }
        Format::Csv => {
            storage
                .write_file(SECTIONS_CSV_FILE, render_section_csv(&file)?.as_bytes())
                .await?;
            println!(
                "✅ CSV file '{}' has been created successfully!",
                storage.display_path(SECTIONS_CSV_FILE)
            );
        }
    }

    Ok(())
}
