//! Payloads served when neither the origin nor the cache can answer.

/// Offline page for navigations.
pub const OFFLINE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en-AU">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="noindex">
<title>Offline | Still Waters Counselling</title>
<style>
body{font-family:system-ui,sans-serif;background:#f4f1ec;color:#23363a;margin:0;display:flex;min-height:100vh;align-items:center;justify-content:center}
main{max-width:32rem;padding:2rem;text-align:center}
h1{color:#2f5d62;font-weight:600}
a{color:#2f5d62}
</style>
</head>
<body>
<main>
<h1>You're offline</h1>
<p>We can't reach Still Waters Counselling right now. Pages you have visited recently are still available.</p>
<p>If you need to talk to someone urgently, call Lifeline on <a href="tel:131114">13 11 14</a> or 000 in an emergency.</p>
<p><a href="/">Try again</a></p>
</main>
</body>
</html>
"#;

/// Stand-in for images that could not be fetched.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300" viewBox="0 0 400 300" role="img" aria-label="Image unavailable offline"><rect width="400" height="300" fill="#e6e1d8"/><path d="M150 190l40-50 30 36 20-24 40 38z" fill="#c2b9aa"/><circle cx="250" cy="110" r="16" fill="#c2b9aa"/><text x="200" y="250" font-family="system-ui,sans-serif" font-size="16" fill="#6b6257" text-anchor="middle">Image unavailable offline</text></svg>"##;

/// Body for everything else.
pub const SERVICE_UNAVAILABLE_TEXT: &str = "Service unavailable: you appear to be offline.";

/// Message in the JSON body of an offline API response.
pub const API_OFFLINE_MESSAGE: &str = "Network unavailable";
