//! Template application files
//!
//! Used wholesale by [`crate::TemplateGenerator`] and to fill in any required
//! file a model reply leaves out.

use appforge_core::GeneratedFiles;

/// Files every generated application must contain
pub const REQUIRED_FILES: [&str; 5] = ["README.md", "index.html", "style.css", "script.js", "LICENSE"];

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Generated App</title>
    <link rel="stylesheet" href="style.css">
</head>
<body>
    <div class="container">
        <h1>Generated Application</h1>
        <div id="app-content">
            <p>Application content will be loaded here.</p>
        </div>
    </div>
    <script src="script.js"></script>
</body>
</html>
"#;

const STYLE_CSS: &str = r#"body {
    font-family: Arial, sans-serif;
    margin: 0;
    padding: 20px;
    background-color: #f5f5f5;
}

.container {
    max-width: 800px;
    margin: 0 auto;
    background: white;
    padding: 20px;
    border-radius: 8px;
    box-shadow: 0 2px 4px rgba(0, 0, 0, 0.1);
}

h1 {
    color: #333;
    text-align: center;
}

#app-content {
    margin-top: 20px;
    padding: 20px;
    border: 1px solid #ddd;
    border-radius: 4px;
}
"#;

const SCRIPT_JS: &str = r#"document.addEventListener('DOMContentLoaded', function () {
    const appContent = document.getElementById('app-content');
    if (appContent) {
        appContent.innerHTML = '<p>Application is running successfully!</p>';
    }
});
"#;

const MIT_LICENSE: &str = r#"MIT License

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
"#;

fn readme(brief: &str) -> String {
    format!(
        "# Generated Application\n\n\
         ## Description\n{}\n\n\
         ## Setup\n\
         1. Clone this repository\n\
         2. Open `index.html` in a web browser\n\
         3. No build process required\n\n\
         ## License\nMIT License\n",
        brief
    )
}

/// Template content for `filename`
///
/// Unknown names get a one-line placeholder.
pub fn template_file(filename: &str, brief: &str) -> String {
    match filename {
        "README.md" => readme(brief),
        "index.html" => INDEX_HTML.to_string(),
        "style.css" => STYLE_CSS.to_string(),
        "script.js" => SCRIPT_JS.to_string(),
        "LICENSE" => MIT_LICENSE.to_string(),
        other => format!("# {}\n\nContent for {}\n", other, other),
    }
}

/// The full template application for `brief`
pub fn template_files(brief: &str) -> GeneratedFiles {
    REQUIRED_FILES
        .iter()
        .map(|name| (name.to_string(), template_file(name, brief)))
        .collect()
}
