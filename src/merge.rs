//! Marker-delimited section merge for shared files.
//!
//! Routes live in a file users also edit, so merge replaces only the
//! generated section, located by its marker comment. When the marker
//! cannot be found the section is appended — degrading to append is
//! mandatory, never corrupt the target.

/// Marker opening the generated routes section.
pub const ROUTES_MARKER: &str = "// AI-Native Generated Routes";
/// Marker opening the generated auth routes section.
pub const AUTH_ROUTES_MARKER: &str = "// AI-Native Authentication Routes";

/// Replace the marker-delimited section, or append the new section when
/// the marker is absent. The section runs from the marker line to the
/// next `/*` block or the end of the file.
pub fn replace_or_append(existing: &str, marker: &str, section: &str) -> String {
    let Some(start) = existing.find(marker) else {
        return append_section(existing, section);
    };
    let end = existing[start..]
        .find("/*")
        .map(|offset| start + offset)
        .unwrap_or(existing.len());

    let mut merged = String::with_capacity(existing.len() + section.len());
    merged.push_str(&existing[..start]);
    merged.push_str(section);
    if end < existing.len() {
        if !merged.ends_with('\n') {
            merged.push('\n');
        }
        merged.push_str(&existing[end..]);
    }
    merged
}

/// Append a section with a separating blank line.
pub fn append_section(existing: &str, section: &str) -> String {
    if existing.trim().is_empty() {
        return section.to_string();
    }
    format!("{}\n\n{}", existing.trim_end(), section)
}

/// Whether the file already carries the marker.
pub fn has_marker(existing: &str, marker: &str) -> bool {
    existing.contains(marker)
}
