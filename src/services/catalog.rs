//! Static reference datasets the dashboard renders next to the live aggregates.

use crate::types::{Alert, AlertPriority, DataSourceNote, Segment, ShortageLevel, SupplyComponent};

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

type SegmentRow<'a> = (&'a str, &'a str, i64, f64, u8, &'a str, &'a [&'a str], &'a [&'a str]);

pub fn segments() -> Vec<Segment> {
    let rows: [SegmentRow; 6] = [
        (
            "humanoid",
            "Humanoid Robots",
            298,
            3.2,
            97,
            "#8b5cf6",
            &["TSLA", "Figure AI", "Boston Dynamics"],
            &["Harmonic Drives", "Servo Motors", "AI Chips", "Force Sensors"],
        ),
        (
            "surgical",
            "Surgical Robotics",
            44,
            19.8,
            86,
            "#ec4899",
            &["ISRG"],
            &["Vision Systems", "Force Sensors", "Controllers/PLCs"],
        ),
        (
            "warehouse",
            "Warehouse/Logistics",
            62,
            26.5,
            93,
            "#3b82f6",
            &["SYM", "AMZN"],
            &["LiDAR Sensors", "Vision Systems", "Controllers/PLCs", "Batteries/Power"],
        ),
        (
            "cobot",
            "Collaborative Robots",
            52,
            14.2,
            89,
            "#10b981",
            &["ABB", "FANUY", "ROK"],
            &["Force Sensors", "Servo Motors", "Vision Systems"],
        ),
        (
            "agri",
            "Agricultural Robots",
            42,
            9.8,
            78,
            "#f59e0b",
            &[],
            &["LiDAR Sensors", "Vision Systems", "Batteries/Power"],
        ),
        (
            "industrial",
            "Industrial Arms",
            16,
            54.8,
            62,
            "#6366f1",
            &["ABB", "FANUY", "ROK"],
            &["Servo Motors", "Harmonic Drives", "Controllers/PLCs"],
        ),
    ];

    rows.into_iter()
        .map(
            |(id, name, growth, market_size, momentum, color, companies, components)| Segment {
                id: id.to_string(),
                name: name.to_string(),
                growth,
                market_size,
                momentum,
                color: color.to_string(),
                companies: strings(companies),
                components: strings(components),
            },
        )
        .collect()
}

type SupplyRow<'a> = (&'a str, &'a str, [&'a str; 3], u8, u32, u8, i64, ShortageLevel, &'a str);

pub fn supply_chain() -> Vec<SupplyComponent> {
    use ShortageLevel::*;

    let rows: [SupplyRow; 8] = [
        ("ai-chips", "AI Chips", ["NVIDIA", "AMD", "Intel"], 84, 14, 98, 8, Medium, "USA/Taiwan"),
        ("servo", "Servo Motors", ["Yaskawa", "Fanuc", "Siemens"], 71, 11, 92, 6, Medium, "Japan/Germany"),
        ("lidar", "LiDAR Sensors", ["Hesai", "Luminar", "Velodyne"], 62, 8, 84, -18, Low, "China/USA"),
        ("harmonic", "Harmonic Drives", ["Harmonic Drive", "Nabtesco", "Sumitomo"], 89, 22, 96, 22, Critical, "Japan"),
        ("force", "Force Sensors", ["ATI", "Robotiq", "OnRobot"], 56, 7, 78, 4, Low, "USA/Denmark"),
        ("vision", "Vision Systems", ["Cognex", "Keyence", "Basler"], 60, 5, 82, 2, Low, "USA/Japan/Germany"),
        ("battery", "Batteries/Power", ["CATL", "LG Energy", "Panasonic"], 76, 12, 88, -12, Low, "China/Korea/Japan"),
        ("plc", "Controllers/PLCs", ["Rockwell", "Siemens", "Mitsubishi"], 54, 6, 75, 1, Low, "USA/Germany/Japan"),
    ];

    rows.into_iter()
        .map(
            |(id, name, suppliers, concentration, lead_time, criticality, price_change, shortage, region)| {
                SupplyComponent {
                    id: id.to_string(),
                    name: name.to_string(),
                    suppliers: strings(&suppliers),
                    concentration,
                    lead_time,
                    criticality,
                    price_change,
                    shortage,
                    region: region.to_string(),
                }
            },
        )
        .collect()
}

pub fn alerts() -> Vec<Alert> {
    use AlertPriority::*;

    [
        (1, "signal", High, "Humanoid momentum crossed 95", "2h ago", false),
        (2, "earnings", Medium, "ISRG earnings in 5 days", "1d ago", false),
        (3, "supply", Critical, "Harmonic drive lead time +2 weeks", "3d ago", true),
        (4, "policy", Medium, "EU robotics subsidy program announced", "5d ago", true),
        (5, "price", Low, "SYM up 8% on volume spike", "1w ago", true),
    ]
    .into_iter()
    .map(|(id, kind, priority, title, time, read)| Alert {
        id,
        kind: kind.to_string(),
        priority,
        title: title.to_string(),
        time: time.to_string(),
        read,
    })
    .collect()
}

pub fn data_sources() -> Vec<DataSourceNote> {
    [
        (
            "companyFinancials",
            "Alpha Vantage company overview",
            "Market cap: shares outstanding x price. Revenue: TTM unless noted.",
            "Refreshed hourly; historical not restated",
        ),
        (
            "marketIndices",
            "Monthly closes from Alpha Vantage or Yahoo Finance",
            "Normalized to 100 at the base month. Not actual tradeable indices.",
            "Refreshed daily; baseline chart served when history is unavailable",
        ),
        (
            "leadingIndicators",
            "USPTO grants, Adzuna postings, NewsAPI articles, Alpha Vantage fundamentals",
            "Heuristic 0-100 scores; see each signal's factors",
            "Refreshed every few minutes; static values served while a provider is down",
        ),
        (
            "supplyChain",
            "SYNTHETIC - For real data use industry reports, customs data",
            "Estimates based on public information",
            "N/A - synthetic estimates",
        ),
    ]
    .into_iter()
    .map(|(dataset, source, definition, revision_policy)| DataSourceNote {
        dataset: dataset.to_string(),
        source: source.to_string(),
        definition: definition.to_string(),
        revision_policy: revision_policy.to_string(),
    })
    .collect()
}
