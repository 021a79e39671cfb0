pub fn render_index() -> &'static str {
    INDEX_HTML
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Adboard</title>
</head>
<body>
  <h1>Adboard</h1>
  <p>Meta ads insights API. Endpoints:</p>
  <ul>
    <li><code>GET /api/accounts</code></li>
    <li><code>GET /api/campaigns?account=&lt;id&gt;</code></li>
    <li><code>GET /api/adsets?campaign=&lt;id&gt;</code></li>
    <li><code>GET /api/summary?account=&lt;id&gt;&amp;since=&amp;until=</code></li>
    <li><code>GET /api/series</code>, <code>/api/demographics</code>, <code>/api/placements</code>, <code>/api/devices</code>, <code>/api/actions</code></li>
    <li><code>GET /api/placements/export</code> (CSV)</li>
    <li><code>GET/PUT /api/session</code></li>
  </ul>
</body>
</html>
"#;
