use anyhow::Context;
use clap::Parser;
use prescription_ai_common::{MatchOptions, Matcher, MedicineCatalog};
use prescription_ai_rust::{analyzer, cli, config, error, export, medicine_info, ocr, scanner, server};
use cli::{Cli, Commands};
use config::Config;
use ocr::cache::CacheFile;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prescription_ai_rust=info".parse()?)
                .add_directive("prescription_ai=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    if let Some(catalog) = &cli.catalog {
        config.catalog_path = catalog.clone();
    }
    if let Some(provider) = cli.ai_provider {
        config.ai_provider = provider;
    }
    if let Some(engine) = cli.ocr_engine {
        config.ocr_engine = engine;
    }

    match cli.command {
        Commands::Serve { addr } => {
            let matcher = load_matcher(&config, config.match_options())?;
            let state = server::AppState {
                matcher,
                extractor: ocr::build_extractor(&config),
                ai_provider: config.ai_provider,
            };
            let addr = addr.unwrap_or_else(|| config.bind_addr.clone());
            server::serve(state, &addr).await?;
        }

        Commands::Analyze { path, output, format, title, limit, threshold, use_cache, info } => {
            println!("💊 prescription-ai - 処方箋解析\n");

            let options = override_options(config.match_options(), limit, threshold)?;
            let matcher = load_matcher(&config, options)?;
            let extractor = ocr::build_extractor(&config);

            // 1. 画像スキャン
            println!("[1/3] 画像をスキャン中...");
            let images = scanner::collect_images(&path)?;
            if images.is_empty() {
                return Err(error::PrescriptionAiError::NoImagesFound(path.display().to_string()).into());
            }
            println!("✔ {}枚の画像を検出\n", images.len());

            // 2. OCR + 照合
            println!("[2/3] OCR・照合中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let results = if use_cache {
                let cache_dir = cache_dir_for(&path);
                analyzer::analyze_images_with_cache(&images, &cache_dir, extractor.as_ref(), &matcher, cli.verbose)?
            } else {
                analyzer::analyze_images(&images, extractor.as_ref(), &matcher, cli.verbose)?
            };
            let match_count: usize = results.iter().map(|r| r.matches.len()).sum();
            println!("✔ 解析完了（候補 {}件）\n", match_count);

            // 3. 出力
            println!("[3/3] 結果を出力中...");
            match output {
                Some(output) => {
                    export::export_results(&results, &format, &output, &title)?;
                }
                None => println!("{}", serde_json::to_string_pretty(&results)?),
            }

            if info {
                let names: Vec<String> = results
                    .iter()
                    .flat_map(|r| medicine_info::unique_names(&r.matches))
                    .fold(Vec::new(), |mut acc, name| {
                        if !acc.contains(&name) {
                            acc.push(name);
                        }
                        acc
                    });
                print_medicine_info(config.ai_provider, &names)?;
            }

            println!("\n✅ 完了");
        }

        Commands::Match { text, file, limit, threshold } => {
            let query = match (text, file) {
                (Some(text), _) => text,
                (None, Some(file)) => std::fs::read_to_string(&file)
                    .with_context(|| format!("テキストファイルを読めません: {}", file.display()))?,
                (None, None) => anyhow::bail!("照合するテキストか --file を指定してください"),
            };

            let options = override_options(config.match_options(), limit, threshold)?;
            let matcher = load_matcher(&config, options)?;
            let matches = matcher.find_matches(&query);

            if cli.verbose {
                for m in &matches {
                    eprintln!("  {} → {} ({:.1})", m.input_line, m.matched_name, m.score);
                }
            }
            println!("{}", serde_json::to_string_pretty(&matches)?);
        }

        Commands::Info { medicines } => {
            print_medicine_info(config.ai_provider, &medicines)?;
        }

        Commands::Config { set_catalog, show } => {
            if let Some(path) = set_catalog {
                config.set_catalog_path(path)?;
                println!("✔ カタログを設定しました");
            }

            if show {
                println!("設定:");
                println!("  カタログ: {}", config.catalog_path.display());
                println!("  待ち受け: {}", config.bind_addr);
                println!("  候補数: {}", config.match_limit);
                println!("  スコア下限: {}", config.match_threshold);
                println!("  大文字小文字を無視: {}", config.process_case);
                println!("  OCRエンジン: {:?}", config.ocr_engine);
                println!("  OCRコマンド: {} {}", config.ocr_command, config.ocr_args.join(" "));
                println!("  拡大率: {}", config.scale_factor);
                println!("  AIプロバイダ: {}", config.ai_provider.command_name());
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = CacheFile::cache_path(&target);

            if info || !clear {
                if cache_path.exists() {
                    let cache = CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}

/// カタログを読み込んで照合器を作る（読めなければ起動しない）
fn load_matcher(config: &Config, options: MatchOptions) -> anyhow::Result<Arc<Matcher>> {
    let catalog = MedicineCatalog::from_path(&config.catalog_path)
        .with_context(|| format!("カタログを読み込めません: {}", config.catalog_path.display()))?;
    tracing::info!(
        path = %config.catalog_path.display(),
        entries = catalog.len(),
        "medicine catalog loaded"
    );
    Ok(Arc::new(Matcher::new(Arc::new(catalog), options)))
}

fn override_options(
    mut options: MatchOptions,
    limit: Option<usize>,
    threshold: Option<f64>,
) -> anyhow::Result<MatchOptions> {
    if let Some(limit) = limit {
        options.limit = limit;
    }
    if let Some(threshold) = threshold {
        if !(0.0..=100.0).contains(&threshold) {
            anyhow::bail!("スコア下限は0〜100で指定してください: {}", threshold);
        }
        options.threshold = threshold;
    }
    Ok(options)
}

/// 単一ファイルならその親フォルダにキャッシュを置く
fn cache_dir_for(path: &std::path::Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn print_medicine_info(provider: prescription_ai_rust::ai_provider::AiProvider, names: &[String]) -> anyhow::Result<()> {
    println!("\n📋 医薬品情報 ({})", provider.command_name());
    match medicine_info::get_medicine_info(provider, names)? {
        Some(info) => println!("{}", info),
        None => println!("照合された医薬品がありません"),
    }
    Ok(())
}
