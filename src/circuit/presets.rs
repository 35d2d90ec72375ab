//! Built-in reduced-order feeders modelled on the IEEE 34-bus and 123-bus
//! test systems.
//!
//! Both are balanced positive-sequence equivalents on a 1000 kVA base with
//! voltage regulators removed. Line impedances scale with section length.

use super::feeder::{FeederModel, LineDef, LoadDef};

/// Names accepted by `compile`.
pub const BUILTIN_FEEDERS: &[&str] = &["ieee34", "ieee123"];

const BASE_KVA: f64 = 1000.0;

/// Looks up a built-in feeder by name.
pub fn builtin(name: &str) -> Option<FeederModel> {
    match name.to_ascii_lowercase().as_str() {
        "ieee34" | "ieee34mod1" => Some(ieee34()),
        "ieee123" => Some(ieee123()),
        _ => None,
    }
}

/// Main-line and lateral section on the 24.9 kV system, lengths in kft.
fn line34(name: &str, from: &str, to: &str, kft: f64, lateral: bool) -> LineDef {
    let (r, x) = if lateral { (0.00095, 0.00050) } else { (0.00040, 0.00041) };
    LineDef::new(name, from, to, r * kft, x * kft)
}

/// Section on the 4.16 kV system, lengths in kft.
fn line4kv(name: &str, from: &str, to: &str, kft: f64, lateral: bool) -> LineDef {
    let (r, x) = if lateral { (0.0100, 0.0090) } else { (0.0050, 0.0116) };
    LineDef::new(name, from, to, r * kft, x * kft)
}

/// IEEE 34-bus stand-in: long 24.9 kV feeder with a 24.9/4.16 kV
/// transformer feeding bus 890.
pub fn ieee34() -> FeederModel {
    let lines = vec![
        line34("l800_802", "800", "802", 2.58, false),
        line34("l802_806", "802", "806", 1.73, false),
        line34("l806_808", "806", "808", 32.23, false),
        line34("l808_810", "808", "810", 5.80, true),
        line34("l808_812", "808", "812", 37.50, false),
        line34("l812_814", "812", "814", 29.73, false),
        line34("l814_850", "814", "850", 0.01, false),
        line34("l850_816", "850", "816", 0.31, false),
        line34("l816_818", "816", "818", 1.71, true),
        line34("l818_820", "818", "820", 48.15, true),
        line34("l820_822", "820", "822", 13.74, true),
        line34("l816_824", "816", "824", 10.21, false),
        line34("l824_826", "824", "826", 3.03, true),
        line34("l824_828", "824", "828", 0.84, false),
        line34("l828_830", "828", "830", 20.44, false),
        line34("l830_854", "830", "854", 0.52, false),
        line34("l854_856", "854", "856", 23.33, true),
        line34("l854_852", "854", "852", 36.83, false),
        line34("l852_832", "852", "832", 0.01, false),
        // 500 kVA, R = 1.9 %, X = 4.08 % on its own base
        LineDef::new("xfm1", "832", "888", 0.038, 0.0816),
        line4kv("l888_890", "888", "890", 2.0, false),
        line34("l832_858", "832", "858", 4.90, false),
        line34("l858_864", "858", "864", 1.62, true),
        line34("l858_834", "858", "834", 5.83, false),
        line34("l834_860", "834", "860", 2.02, false),
        line34("l860_836", "860", "836", 2.68, false),
        line34("l836_840", "836", "840", 0.86, false),
        line34("l836_862", "836", "862", 0.28, false),
        line34("l862_838", "862", "838", 4.86, true),
        line34("l834_842", "834", "842", 0.28, false),
        line34("l842_844", "842", "844", 1.35, false),
        line34("l844_846", "844", "846", 3.64, false),
        line34("l846_848", "846", "848", 0.53, false),
    ];

    let loads = [
        ("s806", "806", 55.0, 29.0),
        ("s810", "810", 16.0, 8.0),
        ("s820", "820", 34.0, 17.0),
        ("s822", "822", 135.0, 70.0),
        ("s824", "824", 5.0, 2.0),
        ("s826", "826", 40.0, 20.0),
        ("s828", "828", 4.0, 2.0),
        ("s830", "830", 52.0, 23.0),
        ("s856", "856", 4.0, 2.0),
        ("s858", "858", 7.0, 3.0),
        ("s864", "864", 2.0, 1.0),
        ("s834", "834", 16.0, 8.0),
        ("s860", "860", 76.0, 56.0),
        ("s836", "836", 30.0, 15.0),
        ("s840", "840", 45.0, 32.0),
        ("s838", "838", 28.0, 14.0),
        ("s844", "844", 414.0, 320.0),
        ("s846", "846", 25.0, 12.0),
        ("s848", "848", 83.0, 59.0),
        ("s890", "890", 450.0, 225.0),
    ]
    .into_iter()
    .map(|(name, bus, kw, kvar)| LoadDef::new(name, bus, kw, kvar))
    .collect();

    FeederModel {
        name: "ieee34".into(),
        base_kva: BASE_KVA,
        source_bus: "800".into(),
        source_pu: 1.05,
        lines,
        loads,
    }
}

/// IEEE 123-bus stand-in: 4.16 kV feeder split into switchable zones.
///
/// Sectionalising switches `sw1`..`sw7` are normally closed; ties `sw8`
/// (49-91), `sw9` (89-450) and `sw10` (60-105) are normally open.
pub fn ieee123() -> FeederModel {
    let lines = vec![
        line4kv("l150_149", "150", "149", 0.5, false),
        line4kv("l149_1", "149", "1", 0.4, false),
        line4kv("l1_3", "1", "3", 0.25, true),
        line4kv("l3_4", "3", "4", 0.2, true),
        line4kv("l1_7", "1", "7", 0.3, false),
        line4kv("l7_8", "7", "8", 0.2, false),
        // zone 1
        LineDef::switch("sw1", "1", "13", false),
        line4kv("l13_18", "13", "18", 0.825, false),
        line4kv("l13_52", "13", "52", 0.4, false),
        // zone 2
        LineDef::switch("sw2", "18", "135", false),
        line4kv("l135_35", "135", "35", 0.375, false),
        line4kv("l35_40", "35", "40", 0.25, false),
        line4kv("l40_44", "40", "44", 0.2, false),
        line4kv("l44_47", "44", "47", 0.25, false),
        line4kv("l47_49", "47", "49", 0.25, true),
        // zone 3
        LineDef::switch("sw3", "52", "54", false),
        line4kv("l54_57", "54", "57", 0.35, false),
        line4kv("l57_60", "57", "60", 0.75, false),
        // zone 4
        LineDef::switch("sw4", "60", "160", false),
        line4kv("l160_67", "160", "67", 0.35, false),
        line4kv("l67_69", "67", "69", 0.275, true),
        line4kv("l69_71", "69", "71", 0.275, true),
        line4kv("l67_72", "67", "72", 0.275, false),
        // zone 5
        LineDef::switch("sw5", "72", "76", false),
        line4kv("l76_86", "76", "86", 0.7, false),
        line4kv("l86_87", "86", "87", 0.45, false),
        line4kv("l87_89", "87", "89", 0.275, false),
        line4kv("l89_91", "89", "91", 0.225, true),
        // zone 6
        LineDef::switch("sw6", "8", "97", false),
        line4kv("l97_101", "97", "101", 0.25, false),
        line4kv("l101_105", "101", "105", 0.275, false),
        line4kv("l105_108", "105", "108", 0.325, false),
        // zone 7
        LineDef::switch("sw7", "108", "300", false),
        line4kv("l300_350", "300", "350", 0.2, false),
        line4kv("l350_450", "350", "450", 0.3, true),
        // ties
        LineDef::switch("sw8", "49", "91", true),
        LineDef::switch("sw9", "89", "450", true),
        LineDef::switch("sw10", "60", "105", true),
    ];

    let loads = [
        ("s1", "1", 40.0, 20.0),
        ("s4", "4", 40.0, 20.0),
        ("s7", "7", 20.0, 10.0),
        ("s13", "13", 40.0, 20.0),
        ("s18", "18", 40.0, 20.0),
        ("s52", "52", 40.0, 20.0),
        ("s135", "135", 40.0, 20.0),
        ("s35", "35", 40.0, 20.0),
        ("s40", "40", 75.0, 35.0),
        ("s44", "44", 40.0, 20.0),
        ("s47", "47", 105.0, 75.0),
        ("s49", "49", 140.0, 95.0),
        ("s54", "54", 40.0, 20.0),
        ("s57", "57", 40.0, 20.0),
        ("s60", "60", 20.0, 10.0),
        ("s67", "67", 40.0, 20.0),
        ("s69", "69", 40.0, 20.0),
        ("s71", "71", 40.0, 20.0),
        ("s72", "72", 40.0, 20.0),
        ("s76", "76", 245.0, 180.0),
        ("s86", "86", 20.0, 10.0),
        ("s87", "87", 40.0, 20.0),
        ("s89", "89", 40.0, 20.0),
        ("s91", "91", 40.0, 20.0),
        ("s97", "97", 40.0, 20.0),
        ("s101", "101", 40.0, 20.0),
        ("s105", "105", 40.0, 20.0),
        ("s108", "108", 40.0, 20.0),
        ("s300", "300", 40.0, 20.0),
        ("s350", "350", 40.0, 20.0),
        ("s450", "450", 40.0, 20.0),
    ]
    .into_iter()
    .map(|(name, bus, kw, kvar)| LoadDef::new(name, bus, kw, kvar))
    .collect();

    FeederModel {
        name: "ieee123".into(),
        base_kva: BASE_KVA,
        source_bus: "150".into(),
        source_pu: 1.04,
        lines,
        loads,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_validate() {
        for name in BUILTIN_FEEDERS {
            let model = builtin(name).unwrap();
            assert!(model.validate().is_ok(), "{name} should validate");
        }
        assert!(builtin("ieee8500").is_none());
    }

    #[test]
    fn ieee34_has_34_buses_and_pv_bus() {
        let model = ieee34();
        let buses = model.bus_names();
        assert_eq!(buses.len(), 34);
        assert!(buses.iter().any(|b| b == "890"));
    }

    #[test]
    fn ieee123_switch_layout() {
        let model = ieee123();
        let switches: Vec<&LineDef> = model.lines.iter().filter(|l| l.switch).collect();
        assert_eq!(switches.len(), 10);
        assert_eq!(switches.iter().filter(|l| l.normally_open).count(), 3);
        assert!(model.bus_names().iter().any(|b| b == "71"));
    }
}
