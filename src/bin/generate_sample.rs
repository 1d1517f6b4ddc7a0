//! Writes a synthetic data bundle under `data/` so the viewer can be
//! exercised without the real exports: the six tabular resources plus a
//! small forest artifact whose predictions track the generated sales.

use std::path::Path;

use serde_json::{Value, json};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn uniform(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller.
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.uniform().max(f64::MIN_POSITIVE);
        let u2 = self.uniform();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Calendar helpers (weekly ISO dates, no calendar crate)
// ---------------------------------------------------------------------------

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) {
                29
            } else {
                28
            }
        }
    }
}

/// `count` ISO dates, one week apart, starting at the given day.
fn weekly_dates(mut year: i32, mut month: u32, mut day: u32, count: usize) -> Vec<String> {
    let mut dates = Vec::with_capacity(count);
    for _ in 0..count {
        dates.push(format!("{year:04}-{month:02}-{day:02}"));
        day += 7;
        while day > days_in_month(year, month) {
            day -= days_in_month(year, month);
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }
    }
    dates
}

// ---------------------------------------------------------------------------
// Sales model: store and department terms plus seasonality and noise
// ---------------------------------------------------------------------------

const STORES: [i64; 4] = [1, 2, 3, 4];
const DEPTS: [i64; 3] = [1, 2, 3];
const HOLIDAY_WEEKS: [usize; 3] = [5, 46, 50];

const FEATURES: [&str; 7] = [
    "Store",
    "Dept",
    "IsHoliday",
    "Temperature",
    "Fuel_Price",
    "CPI",
    "Unemployment",
];

fn store_term(store: i64) -> f64 {
    8000.0 * store as f64
}

fn dept_term(dept: i64) -> f64 {
    1500.0 * dept as f64
}

struct Row {
    store: i64,
    dept: i64,
    date: String,
    is_holiday: bool,
    temperature: f64,
    fuel_price: f64,
    cpi: f64,
    unemployment: f64,
    weekly_sales: f64,
}

fn generate_rows(dates: &[String], rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    for store in STORES {
        for dept in DEPTS {
            for (week, date) in dates.iter().enumerate() {
                let is_holiday = HOLIDAY_WEEKS.contains(&(week % 52));
                let seasonal =
                    2000.0 * (2.0 * std::f64::consts::PI * (week % 52) as f64 / 52.0).sin();
                let boost = if is_holiday { 3500.0 } else { 0.0 };
                let weekly_sales = (store_term(store)
                    + dept_term(dept)
                    + seasonal
                    + boost
                    + rng.gauss(0.0, 900.0))
                .max(0.0);

                rows.push(Row {
                    store,
                    dept,
                    date: date.clone(),
                    is_holiday,
                    temperature: rng.gauss(15.0, 9.0),
                    fuel_price: rng.gauss(3.3, 0.25),
                    cpi: rng.gauss(172.0, 4.0),
                    unemployment: rng.gauss(7.8, 0.6),
                    weekly_sales,
                });
            }
        }
    }
    rows
}

// ---------------------------------------------------------------------------
// Writers
// ---------------------------------------------------------------------------

fn write_validation(path: &Path, rows: &[Row]) {
    let mut w = csv::Writer::from_path(path).expect("creating validation table");
    w.write_record(["Store", "Dept", "Date", "Weekly_Sales"])
        .unwrap();
    for r in rows {
        w.write_record([
            r.store.to_string(),
            r.dept.to_string(),
            r.date.clone(),
            format!("{:.2}", r.weekly_sales),
        ])
        .unwrap();
    }
    w.flush().unwrap();
}

fn write_features(path: &Path, rows: &[Row]) {
    let mut w = csv::Writer::from_path(path).expect("creating feature table");
    w.write_record(FEATURES).unwrap();
    for r in rows {
        w.write_record([
            r.store.to_string(),
            r.dept.to_string(),
            (if r.is_holiday { "1" } else { "0" }).to_string(),
            format!("{:.2}", r.temperature),
            format!("{:.3}", r.fuel_price),
            format!("{:.2}", r.cpi),
            format!("{:.2}", r.unemployment),
        ])
        .unwrap();
    }
    w.flush().unwrap();
}

fn write_target(path: &Path, rows: &[Row]) {
    let mut w = csv::Writer::from_path(path).expect("creating target series");
    w.write_record(["Weekly_Sales"]).unwrap();
    for r in rows {
        w.write_record([format!("{:.2}", r.weekly_sales)]).unwrap();
    }
    w.flush().unwrap();
}

fn split(feature: usize, threshold: f64, left: usize, right: usize) -> Value {
    json!({ "kind": "split", "feature": feature, "threshold": threshold, "left": left, "right": right })
}

fn leaf(value: f64) -> Value {
    json!({ "kind": "leaf", "value": value })
}

/// Two averaged trees: one over the store term, one over the department
/// term, each doubled so the ensemble mean reproduces the additive model.
fn write_model(path: &Path) {
    let store_tree = json!({
        "nodes": [
            split(0, 2.5, 1, 2),
            split(0, 1.5, 3, 4),
            split(0, 3.5, 5, 6),
            leaf(2.0 * store_term(1)),
            leaf(2.0 * store_term(2)),
            leaf(2.0 * store_term(3)),
            leaf(2.0 * store_term(4)),
        ]
    });
    let dept_tree = json!({
        "nodes": [
            split(1, 1.5, 1, 2),
            leaf(2.0 * dept_term(1)),
            split(1, 2.5, 3, 4),
            leaf(2.0 * dept_term(2)),
            leaf(2.0 * dept_term(3)),
        ]
    });

    let model = json!({
        "feature_names": FEATURES,
        "importances": [0.45, 0.20, 0.05, 0.12, 0.08, 0.06, 0.04],
        "trees": [store_tree, dept_tree],
    });

    std::fs::write(path, serde_json::to_string_pretty(&model).unwrap())
        .expect("writing model artifact");
}

fn main() {
    let out_dir = Path::new("data");
    std::fs::create_dir_all(out_dir).expect("creating data directory");

    let mut rng = SimpleRng::new(42);

    let train_rows = generate_rows(&weekly_dates(2010, 1, 8, 52), &mut rng);
    let validation_rows = generate_rows(&weekly_dates(2011, 1, 7, 26), &mut rng);
    let test_rows = generate_rows(&weekly_dates(2011, 7, 8, 13), &mut rng);

    write_features(&out_dir.join("train_features.csv"), &train_rows);
    write_target(&out_dir.join("train_target.csv"), &train_rows);

    write_validation(&out_dir.join("validation.csv"), &validation_rows);
    write_features(&out_dir.join("validation_features.csv"), &validation_rows);
    write_target(&out_dir.join("validation_target.csv"), &validation_rows);

    write_features(&out_dir.join("test_features.csv"), &test_rows);

    write_model(&out_dir.join("model.json"));

    println!(
        "Wrote {} train, {} validation, {} test rows and model.json to {}",
        train_rows.len(),
        validation_rows.len(),
        test_rows.len(),
        out_dir.display()
    );
}
