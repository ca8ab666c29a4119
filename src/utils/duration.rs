/// 將 `HH:MM:SS` 或 `MM:SS` 轉成 `1 hr 5 min` 這類易讀字串。
///
/// 段數不是 2 或 3、或任一段不是整數時回傳 `"0 sec"`；
/// 值為零的單位會被省略，全部為零時同樣回傳 `"0 sec"`。
pub fn format_duration(text: &str) -> String {
    let parts: Option<Vec<i64>> = text
        .split(':')
        .map(|part| part.trim().parse::<i64>().ok())
        .collect();

    let (hours, minutes, seconds) = match parts.as_deref() {
        Some([h, m, s]) => (*h, *m, *s),
        Some([m, s]) => (0, *m, *s),
        _ => return ZERO.to_string(),
    };

    let formatted: Vec<String> = [(hours, "hr"), (minutes, "min"), (seconds, "sec")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{} {}", value, unit))
        .collect();

    if formatted.is_empty() {
        ZERO.to_string()
    } else {
        formatted.join(" ")
    }
}

const ZERO: &str = "0 sec";
