use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};

use crate::import::ImportResult;
use taicai_db::models::{DrawRecord, GameDefinition, GameShape, NumberStats, PredictionResult, Tag, ZoneKind};
use taicai_engine::SchoolId;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8], width: usize) -> String {
    numbers
        .iter()
        .map(|n| format!("{:0width$}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn number_width(game: &GameDefinition) -> usize {
    match game.shape {
        GameShape::Digit { .. } => 1,
        _ => 2,
    }
}

fn tag_color(tag: &Tag) -> Color {
    match tag {
        Tag::Hot | Tag::Lucky | Tag::NameNumber | Tag::DailyLuck => Color::Green,
        Tag::ExtremeGap | Tag::Cold(_) => Color::Red,
        Tag::Makeup | Tag::DraggedBy(_) | Tag::HotTail(_) => Color::Yellow,
        _ => Color::White,
    }
}

pub fn display_draws(game: &GameDefinition, draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }

    let width = number_width(game);
    let mut table = match game.shape {
        GameShape::DualZone { .. } => new_table(vec!["Période", "Date", "Zone 1", "Zone 2"]),
        _ => new_table(vec!["Période", "Date", "Numéros"]),
    };

    for draw in draws {
        let mut row = vec![draw.period.clone(), draw.date.to_string()];
        match &game.shape {
            GameShape::DualZone { primary, .. } => {
                let split = primary.count.min(draw.numbers.len());
                let (first, second) = draw.numbers.split_at(split);
                let mut first = first.to_vec();
                first.sort_unstable();
                row.push(join_numbers(&first, width));
                row.push(join_numbers(second, width));
            }
            GameShape::SingleZone { primary } if draw.numbers.len() > primary.count => {
                let (balls, special) = draw.numbers.split_at(primary.count);
                let mut balls = balls.to_vec();
                balls.sort_unstable();
                row.push(format!("{} | {}", join_numbers(&balls, width), join_numbers(special, width)));
            }
            _ => row.push(join_numbers(&draw.numbers, width)),
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total tirages lus : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.unknown_game > 0 {
        println!("  Jeux hors catalogue : {}", result.unknown_game);
    }
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

pub fn display_stats(label: &str, stats: &[NumberStats], window: usize, top: usize) {
    println!("\n── {label} : {top} numéros les plus fréquents sur {window} tirages ──");
    let mut table = new_table(vec!["Numéro", "Fréquence", "Retard"]);
    for stat in stats.iter().take(top) {
        let gap = Cell::new(stat.gap.to_string());
        let gap = if stat.gap as usize >= window && window > 0 {
            gap.fg(Color::Red)
        } else {
            gap
        };
        table.add_row(vec![
            Cell::new(format!("{:2}", stat.number)),
            Cell::new(stat.frequency.to_string()),
            gap,
        ]);
    }
    println!("{table}");
}

pub fn display_predictions(game: &GameDefinition, school: SchoolId, results: &[PredictionResult]) {
    println!("\n🎲 {} / école {school}\n", game.id);
    let width = number_width(game);

    for (i, result) in results.iter().enumerate() {
        let mut table = new_table(vec!["Numéro", "Zone", "Tag"]);
        for n in &result.numbers {
            let zone = match n.zone {
                ZoneKind::Primary => "1",
                ZoneKind::Secondary => "2",
            };
            table.add_row(vec![
                Cell::new(format!("{:0width$}", n.value)),
                Cell::new(zone),
                Cell::new(n.tag.to_string()).fg(tag_color(&n.tag)),
            ]);
        }
        println!("Grille {} : {}", i + 1, join_numbers(&result.values(), width));
        println!("{table}");
        println!("  {}\n", result.group_reason);
    }
}

pub fn display_wheel(game: &GameDefinition, tickets: &[PredictionResult]) {
    if tickets.is_empty() {
        println!("Aucune grille générée.");
        return;
    }
    println!("\n🎡 Pack {} : {} grilles\n", game.id, tickets.len());
    println!("{}\n", tickets[0].group_reason);

    let width = number_width(game);
    let mut table = new_table(vec!["#", "Zone 1", "Zone 2"]);
    for (i, ticket) in tickets.iter().enumerate() {
        let second = ticket.zone_values(ZoneKind::Secondary);
        table.add_row(vec![
            format!("{}", i + 1),
            join_numbers(&ticket.zone_values(ZoneKind::Primary), width),
            if second.is_empty() { "—".to_string() } else { join_numbers(&second, width) },
        ]);
    }
    println!("{table}");
}
