//! Authentication scaffolding: the AuthController and its route section.
use super::join_lines;
use crate::merge::AUTH_ROUTES_MARKER;
use crate::schema::Schema;

/// Render `app/Http/Controllers/AuthController.php` for the configured
/// provider (`sanctum` gets token auth, anything else session auth).
pub fn render_controller(schema: &Schema) -> String {
    if schema.auth.provider == "sanctum" {
        sanctum_controller()
    } else {
        session_controller()
    }
}

/// Render the marker-delimited auth route section.
pub fn render_routes(schema: &Schema) -> String {
    let guard = if schema.auth.provider == "sanctum" {
        "auth:sanctum"
    } else {
        "auth"
    };
    let mut lines: Vec<String> = Vec::new();
    lines.push("use App\\Http\\Controllers\\AuthController;".to_string());
    lines.push(String::new());
    lines.push(AUTH_ROUTES_MARKER.to_string());
    if schema.auth.provider == "sanctum" {
        lines.push("Route::post('/register', [AuthController::class, 'register']);".to_string());
    }
    lines.push("Route::post('/login', [AuthController::class, 'login']);".to_string());
    lines.push(String::new());
    lines.push(format!("Route::middleware('{guard}')->group(function () {{"));
    lines.push("    Route::post('/logout', [AuthController::class, 'logout']);".to_string());
    lines.push("    Route::get('/user', [AuthController::class, 'user']);".to_string());
    lines.push("});".to_string());
    join_lines(&lines)
}

fn sanctum_controller() -> String {
    let lines: Vec<String> = [
        "<?php",
        "",
        "namespace App\\Http\\Controllers;",
        "",
        "use App\\Models\\User;",
        "use Illuminate\\Http\\Request;",
        "use Illuminate\\Support\\Facades\\Hash;",
        "use Illuminate\\Validation\\ValidationException;",
        "",
        "class AuthController extends Controller",
        "{",
        "    public function register(Request $request)",
        "    {",
        "        $request->validate([",
        "            'name' => 'required|string|max:255',",
        "            'email' => 'required|string|email|max:255|unique:users',",
        "            'password' => 'required|string|min:8|confirmed',",
        "        ]);",
        "",
        "        $user = User::create([",
        "            'name' => $request->name,",
        "            'email' => $request->email,",
        "            'password' => Hash::make($request->password),",
        "        ]);",
        "",
        "        $token = $user->createToken('auth-token')->plainTextToken;",
        "",
        "        return response()->json([",
        "            'user' => $user,",
        "            'token' => $token,",
        "            'token_type' => 'Bearer',",
        "        ], 201);",
        "    }",
        "",
        "    public function login(Request $request)",
        "    {",
        "        $request->validate([",
        "            'email' => 'required|email',",
        "            'password' => 'required',",
        "        ]);",
        "",
        "        $user = User::where('email', $request->email)->first();",
        "",
        "        if (!$user || !Hash::check($request->password, $user->password)) {",
        "            throw ValidationException::withMessages([",
        "                'email' => ['The provided credentials are incorrect.'],",
        "            ]);",
        "        }",
        "",
        "        $token = $user->createToken('auth-token')->plainTextToken;",
        "",
        "        return response()->json([",
        "            'user' => $user,",
        "            'token' => $token,",
        "            'token_type' => 'Bearer',",
        "        ]);",
        "    }",
        "",
        "    public function logout(Request $request)",
        "    {",
        "        $request->user()->currentAccessToken()->delete();",
        "",
        "        return response()->json(['message' => 'Successfully logged out']);",
        "    }",
        "",
        "    public function user(Request $request)",
        "    {",
        "        return response()->json($request->user());",
        "    }",
        "}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    join_lines(&lines)
}

fn session_controller() -> String {
    let lines: Vec<String> = [
        "<?php",
        "",
        "namespace App\\Http\\Controllers;",
        "",
        "use Illuminate\\Http\\Request;",
        "use Illuminate\\Support\\Facades\\Auth;",
        "",
        "class AuthController extends Controller",
        "{",
        "    public function login(Request $request)",
        "    {",
        "        $credentials = $request->validate([",
        "            'email' => 'required|email',",
        "            'password' => 'required',",
        "        ]);",
        "",
        "        if (Auth::attempt($credentials)) {",
        "            $request->session()->regenerate();",
        "",
        "            return response()->json([",
        "                'user' => Auth::user(),",
        "                'message' => 'Login successful',",
        "            ]);",
        "        }",
        "",
        "        return response()->json([",
        "            'message' => 'The provided credentials do not match our records.',",
        "        ], 401);",
        "    }",
        "",
        "    public function logout(Request $request)",
        "    {",
        "        Auth::logout();",
        "        $request->session()->invalidate();",
        "        $request->session()->regenerateToken();",
        "",
        "        return response()->json(['message' => 'Successfully logged out']);",
        "    }",
        "",
        "    public function user(Request $request)",
        "    {",
        "        return response()->json($request->user());",
        "    }",
        "}",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    join_lines(&lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::schema_from_value;
    use serde_json::json;

    #[test]
    fn sanctum_controller_issues_tokens() {
        let schema = schema_from_value(json!({
            "meta": {"auth": {"enabled": true, "provider": "sanctum"}},
            "models": {}
        }));
        let text = render_controller(&schema);
        assert!(text.contains("public function register(Request $request)"));
        assert!(text.contains("createToken('auth-token')"));
    }

    #[test]
    fn basic_provider_uses_session_auth() {
        let schema = schema_from_value(json!({
            "meta": {"auth": {"enabled": true, "provider": "basic"}},
            "models": {}
        }));
        let text = render_controller(&schema);
        assert!(!text.contains("register"));
        assert!(text.contains("Auth::attempt($credentials)"));
    }

    #[test]
    fn route_section_guards_logout() {
        let schema = schema_from_value(json!({
            "meta": {"auth": {"enabled": true, "provider": "sanctum"}},
            "models": {}
        }));
        let text = render_routes(&schema);
        assert!(text.contains(AUTH_ROUTES_MARKER));
        assert!(text.contains("Route::post('/register'"));
        assert!(text.contains("Route::middleware('auth:sanctum')"));
    }
}
