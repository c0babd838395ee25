use clap::Parser;
use islegen::{
    GeneratorParams, MapImage, MapSummary, RoadNetwork, SettlementResult, build_roads, generate,
    place_settlements,
};
use serde::Serialize;
use std::path::PathBuf;

/// Генератор фэнтезийных островов: рельеф, реки, биомы, города и дороги
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Путь к конфигурационному файлу в формате TOML (необязательно)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Переопределить сид
    #[arg(short, long)]
    seed: Option<u64>,

    /// Переопределить количество регионов
    #[arg(short, long)]
    points: Option<usize>,

    /// Переопределить количество поселений
    #[arg(short, long)]
    towns: Option<usize>,

    /// Путь для сохранения превью (по умолчанию: ./island.png)
    #[arg(short, long, default_value = "island.png")]
    output: PathBuf,

    /// Масштаб превью (пикселей на единицу карты)
    #[arg(long, default_value_t = 1.0)]
    scale: f64,

    /// Путь для JSON-отчёта
    #[arg(short, long)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    map: MapSummary,
    settlements: &'a SettlementResult,
    roads: &'a RoadNetwork,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut params = match &cli.config {
        Some(path) => {
            println!("🔍 Загрузка конфигурации из {}...", path.display());
            GeneratorParams::from_toml_file(path)?
        }
        None => GeneratorParams::default(),
    };
    if let Some(seed) = cli.seed {
        params.map.seed = seed;
    }
    if let Some(points) = cli.points {
        params.map.num_points = points;
    }
    if let Some(towns) = cli.towns {
        params.settlements.total_towns = towns;
    }

    println!(
        "🏝️  Генерация острова (сид: {}, регионов: {}, размер: {}×{})...",
        params.map.seed, params.map.num_points, params.map.width, params.map.height
    );
    let map = generate(&params.map)?;
    let summary = map.summary();
    println!(
        "   суша: {}, озёра: {}, океан: {}, рёбер с реками: {}",
        summary.land, summary.lakes, summary.ocean, summary.river_edges
    );

    println!("🏘️  Размещение поселений...");
    let placed = place_settlements(&map, &params.settlements)?;
    println!(
        "   размещено {} из {}",
        placed.stats.placed, placed.stats.requested
    );
    if !placed.stats.rules_fulfilled {
        println!(
            "⚠️  Не выполнены минимумы правил: {}",
            placed.stats.unfulfilled_rules.join(", ")
        );
    }

    println!("🛤️  Прокладка дорог...");
    let seed = params.settlements.seed.unwrap_or(params.map.seed);
    let roads = build_roads(&placed.settlements, &map, seed);
    let straight = roads.roads.iter().filter(|r| r.straight_line).count();
    println!(
        "   дорог: {} (по прямой: {}), общая длина {:.0}",
        roads.roads.len(),
        straight,
        roads.total_length()
    );

    println!("Сохранение в {:?}", cli.output);
    let mut image = MapImage::render(&map, cli.scale);
    image.draw_roads(&roads);
    image.draw_settlements(&placed.settlements);
    image.save_as_png(&cli.output.to_string_lossy())?;

    if let Some(path) = &cli.report {
        println!("Сохранение отчёта в {path:?}");
        let report = Report {
            seed: params.map.seed,
            map: summary,
            settlements: &placed,
            roads: &roads,
        };
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
    }

    println!("\nГотово! Остров сохранён.");
    Ok(())
}
