//! API route file rendering.
//!
//! The generated block is delimited by a marker comment so merge mode can
//! replace just that section of a user-edited routes file.
use super::join_lines;
use crate::merge::ROUTES_MARKER;
use crate::naming;
use crate::schema::{RouteVerb, Schema};

/// Render a complete `routes/api.php`.
pub fn render_file(schema: &Schema) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("<?php".to_string());
    lines.push(String::new());
    lines.push("use Illuminate\\Support\\Facades\\Route;".to_string());
    lines.extend(controller_imports(schema));
    lines.push(String::new());
    lines.extend(section_lines(schema));
    join_lines(&lines)
}

/// Render only the marker-delimited generated section, with imports, for
/// merging into an existing file.
pub fn render_section(schema: &Schema) -> String {
    let mut lines = controller_imports(schema);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.extend(section_lines(schema));
    join_lines(&lines)
}

fn controller_imports(schema: &Schema) -> Vec<String> {
    let mut imports = Vec::new();
    for entity in schema.entities.values() {
        if entity.has_routes() {
            let controller = format!("{}Controller", naming::studly(&entity.name));
            imports.push(format!("use App\\Http\\Controllers\\{controller};"));
        }
    }
    imports
}

fn section_lines(schema: &Schema) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    lines.push(ROUTES_MARKER.to_string());

    if schema.global_middlewares.is_empty() {
        lines.push("Route::group([], function () {".to_string());
    } else {
        let middleware = schema
            .global_middlewares
            .iter()
            .map(|m| format!("'{m}'"))
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Route::middleware([{middleware}])->group(function () {{"));
    }

    for entity in schema.entities.values() {
        if !entity.has_routes() {
            continue;
        }
        let controller = format!("{}Controller", naming::studly(&entity.name));
        let segment = naming::resource_segment(&entity.name);
        let parameter = naming::snake(&entity.name);

        lines.push(format!("    // {} routes", entity.name));
        for verb in &entity.routes {
            let line = match verb {
                RouteVerb::List => format!(
                    "    Route::get('{segment}', [{controller}::class, 'index']);"
                ),
                RouteVerb::Show => format!(
                    "    Route::get('{segment}/{{{parameter}}}', [{controller}::class, 'show']);"
                ),
                RouteVerb::Create => format!(
                    "    Route::post('{segment}', [{controller}::class, 'store']);"
                ),
                RouteVerb::Update => format!(
                    "    Route::put('{segment}/{{{parameter}}}', [{controller}::class, 'update']);"
                ),
                RouteVerb::Delete => format!(
                    "    Route::delete('{segment}/{{{parameter}}}', [{controller}::class, 'destroy']);"
                ),
            };
            lines.push(line);
        }

        for field in entity.file_fields() {
            let method = naming::studly(field);
            lines.push(format!(
                "    Route::post('{segment}/{{{parameter}}}/upload/{field}', [{controller}::class, 'upload{method}']);"
            ));
            lines.push(format!(
                "    Route::get('{segment}/{{{parameter}}}/download/{field}', [{controller}::class, 'download{method}']);"
            ));
        }
        lines.push(String::new());
    }

    for route in &schema.custom_routes {
        let method = route.method.to_lowercase();
        lines.push(format!(
            "    Route::{method}('{}', '{}');",
            route.uri, route.controller
        ));
    }

    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines.push("});".to_string());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    fn sample() -> Schema {
        schema_from_value(json!({
            "meta": {"middlewares": ["auth:sanctum", "throttle:60,1"]},
            "models": {
                "BlogPost": {
                    "fields": {
                        "title": "string|required",
                        "cover": "file:covers|nullable"
                    },
                    "routes": ["list", "show", "create"]
                },
                "Internal": {"fields": {"name": "string"}}
            },
            "custom": {
                "routes": [
                    {"method": "GET", "uri": "/health", "controller": "HealthController@show"}
                ]
            }
        }))
    }

    #[test]
    fn renders_resource_routes_with_middleware_group() {
        let text = render_file(&sample());
        assert!(text.contains("use App\\Http\\Controllers\\BlogPostController;"));
        assert!(text.contains("Route::middleware(['auth:sanctum', 'throttle:60,1'])"));
        assert!(text.contains("Route::get('blog-posts', [BlogPostController::class, 'index']);"));
        assert!(text.contains(
            "Route::get('blog-posts/{blog_post}', [BlogPostController::class, 'show']);"
        ));
        assert!(text.contains("Route::post('blog-posts', [BlogPostController::class, 'store']);"));
        // No update/delete verbs declared.
        assert!(!text.contains("'update'"));
        assert!(!text.contains("'destroy'"));
        // Entities without routes get no controller import.
        assert!(!text.contains("InternalController"));
    }

    #[test]
    fn file_fields_add_upload_download_routes() {
        let text = render_file(&sample());
        assert!(text.contains(
            "Route::post('blog-posts/{blog_post}/upload/cover', [BlogPostController::class, 'uploadCover']);"
        ));
        assert!(text.contains(
            "Route::get('blog-posts/{blog_post}/download/cover', [BlogPostController::class, 'downloadCover']);"
        ));
    }

    #[test]
    fn custom_routes_are_listed() {
        let text = render_file(&sample());
        assert!(text.contains("Route::get('/health', 'HealthController@show');"));
    }

    #[test]
    fn section_is_marker_delimited() {
        let text = render_section(&sample());
        assert!(text.contains(ROUTES_MARKER));
        assert!(!text.contains("<?php"));
    }
}
