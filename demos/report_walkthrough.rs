use anyhow::Result;
use chrono::NaiveDate;
use cpi_report_builder::{
    ChartKind, Indicator, RealOutcome, ReportConfig, ReportSession, Screen, ScreenOutcome,
    Selection, Source,
};

fn describe(outcome: ScreenOutcome<Screen>) {
    match outcome {
        ScreenOutcome::Ready(Screen::TimeSeries(report)) => {
            println!("{} [{}]", report.title, report.range.label());
            for point in &report.points {
                println!(
                    "  {}  {:>10.2}  {}",
                    point.date.format("%Y-%m"),
                    point.value,
                    point.label.as_deref().unwrap_or("")
                );
            }
            if let Some(annotation) = &report.annotation {
                println!("  {}", annotation);
            }
        }
        ScreenOutcome::Ready(Screen::Cumulative(report)) => {
            println!("{} [{}]", report.title, report.range.label());
            println!(
                "  Index {:.2} -> {:.2}, accumulated inflation {:.2}%",
                report.index_start, report.index_end, report.accumulated_inflation_pct
            );
            if let Some(adjustment) = &report.adjustment {
                println!(
                    "  {:.2} then is {:.2} now",
                    adjustment.amount, adjustment.adjusted_amount
                );
                if let Some(real) = &adjustment.real {
                    let verdict = match real.outcome {
                        RealOutcome::Gain => "gained",
                        RealOutcome::Loss => "lost",
                    };
                    println!(
                        "  Actual {:.2}: {} {:.2} in real terms",
                        real.actual_amount,
                        verdict,
                        real.difference.abs()
                    );
                }
            }
        }
        ScreenOutcome::Ready(Screen::RegionalComparison(report)) => {
            println!("{} [{}]", report.title, report.range.label());
            for series in &report.series {
                let last = series.points.last().map(|p| p.value).unwrap_or_default();
                println!("  {:<20} latest {:>8.2}", series.region, last);
            }
        }
        ScreenOutcome::Ready(Screen::Heatmap(report)) => {
            println!("{} [{}]", report.title, report.range.label());
            for (category, row) in report.categories.iter().zip(&report.cells) {
                let cells: Vec<String> = row
                    .iter()
                    .map(|cell| cell.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".into()))
                    .collect();
                println!("  {:<40} {}", category, cells.join(" "));
            }
        }
        other => println!("(no chart) {}", other.message().unwrap_or_default()),
    }
    println!();
}

fn main() -> Result<()> {
    env_logger::init();

    let dataset_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/sample_ipc.csv".to_string());
    let config = ReportConfig {
        dataset_path: dataset_path.into(),
        ..ReportConfig::default()
    };
    let session = ReportSession::load(config)?;
    println!("Loaded {} rows\n", session.table().len());

    let base = Selection {
        source: Some(Source::Variations),
        ..Selection::default()
    };

    if let Some(options) = session.options(&base).ready() {
        println!("Sources: {:?}", options.sources);
        println!("Regions: {:?}", options.regions);
        println!("Categories: {:?}", options.categories);
        println!(
            "Preselected: {} / {} / {}\n",
            options.region, options.category, options.indicator
        );
    }

    describe(session.render(&base));

    describe(session.render(&Selection {
        indicator: Some(Indicator::YoyChange),
        start: NaiveDate::from_ymd_opt(2023, 1, 1),
        ..base.clone()
    }));

    describe(session.render(&Selection {
        chart: ChartKind::Cumulative,
        start: NaiveDate::from_ymd_opt(2022, 1, 1),
        end: NaiveDate::from_ymd_opt(2023, 12, 1),
        amount: Some(100_000.0),
        actual_amount: Some(150_000.0),
        ..base.clone()
    }));

    describe(session.render(&Selection {
        chart: ChartKind::RegionalComparison,
        indicator: Some(Indicator::Index),
        start: NaiveDate::from_ymd_opt(2023, 7, 1),
        ..base.clone()
    }));

    describe(session.render(&Selection {
        chart: ChartKind::Heatmap,
        region: Some("Región Cuyo".to_string()),
        start: NaiveDate::from_ymd_opt(2023, 10, 1),
        ..base.clone()
    }));

    describe(session.render(&Selection {
        source: Some(Source::Prices),
        region: Some("Región GBA".to_string()),
        ..Selection::default()
    }));

    println!("Selection schema:\n{}", Selection::schema_as_json()?);

    Ok(())
}
