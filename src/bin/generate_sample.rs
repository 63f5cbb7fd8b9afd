use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};

const HEADER: [&str; 11] = [
    "Laboratory name",
    "Country",
    "City / District (Department)",
    "Health facility address",
    "Select the laboratory complexity level",
    "HIV rapid antibody test",
    "ELISA chain",
    "Ebola virus",
    "Widal test (typhoid)",
    "GPS coordinates",
    "Respondent personal phone number",
];

/// The four reference laboratories, one per tier.
const REFERENCE_LABS: [[&str; 11]; 4] = [
    ["Lab Central", "Country A", "City 1", "Address 1", "Level I", "yes", "no", "notavailable", "yes", "GPS1", "123"],
    ["Lab Ville", "Country A", "City 2", "Address 2", "Level II", "no", "yes", "serology", "yes", "GPS2", "456"],
    ["Lab Régional", "Country B", "City 3", "Address 3", "Level III", "yes", "yes", "notavailable", "no", "GPS3", "789"],
    ["Lab National", "Country B", "City 4", "Address 4", "Level IV", "yes", "yes", "viralload", "yes", "GPS4", "012"],
];

const TIERS: [&str; 4] = ["Level I", "Level II", "Level III", "Level IV"];
const COUNTRIES: [&str; 3] = ["Country A", "Country B", "Country C"];
const EBOLA: [&str; 3] = ["notavailable", "serology", "viralload"];

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

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[(self.next_u64() % items.len() as u64) as usize]
    }

    /// `"yes"` with probability `p`, else `"no"`; occasionally blank.
    fn yes_no(&mut self, p: f64) -> &'static str {
        let r = self.next_f64();
        if r < 0.05 {
            ""
        } else if r < p {
            "yes"
        } else {
            "no"
        }
    }
}

/// A synthetic laboratory. Higher tiers offer more tests.
fn synthetic_lab(i: usize, rng: &mut SimpleRng) -> Vec<String> {
    let tier_idx = (rng.next_u64() % TIERS.len() as u64) as usize;
    let capacity = 0.3 + 0.2 * tier_idx as f64;
    let lat = -5.0 + rng.next_f64() * 20.0;
    let lon = -15.0 + rng.next_f64() * 30.0;

    vec![
        format!("Lab {:03}", i + 1),
        rng.pick(&COUNTRIES).to_string(),
        format!("City {}", 5 + rng.next_u64() % 40),
        format!("Address {}", i + 5),
        TIERS[tier_idx].to_string(),
        rng.yes_no(capacity + 0.3).to_string(),
        rng.yes_no(capacity).to_string(),
        (if tier_idx >= 2 { rng.pick(&EBOLA) } else { "notavailable" }).to_string(),
        rng.yes_no(0.7).to_string(),
        format!("{lat:.4}, {lon:.4}"),
        format!("{:09}", rng.next_u64() % 1_000_000_000),
    ]
}

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let output_path = args
        .next()
        .unwrap_or_else(|| "Data_LabMab_2025_merge_final_LabMab_29_09_2025_for_R_.xlsx".into());
    let extra_rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count '{n}'"))?,
        None => 96,
    };

    let mut rng = SimpleRng::new(42);
    let mut rows: Vec<Vec<String>> = REFERENCE_LABS
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect();
    rows.extend((0..extra_rows).map(|i| synthetic_lab(i, &mut rng)));

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1")?;

    for (c, h) in HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, c as u16, *h, &bold)?;
    }
    for (r, row) in rows.iter().enumerate() {
        for (c, v) in row.iter().enumerate() {
            if !v.is_empty() {
                sheet.write_string(r as u32 + 1, c as u16, v)?;
            }
        }
    }

    workbook
        .save(&output_path)
        .with_context(|| format!("writing {output_path}"))?;

    println!("Wrote {} laboratories to {output_path}", rows.len());
    Ok(())
}
