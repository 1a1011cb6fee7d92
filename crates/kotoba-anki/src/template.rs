use kotoba_types::SourceResults;

const RED: &str = "CC2222";
const YELLOW: &str = "ECE0B2";
const JOINER: &str = "<br />As well as<br />";
const GUESS_WARNING: &str = "<br />Warning: This is a guess entry";

/// Provider names whose own label never gets a section; their sub-dictionaries do
const PROVIDER_LABELS: &[&str] = &["Weblio"];

/// Card-template script driving the buttons in [`build_definition_html`]
pub const TOGGLE_SCRIPT: &str = r#"<script>
function toggleDefinition(id) {
  var el = document.getElementById(id);
  el.style.display = el.style.display === 'none' ? 'block' : 'none';
}
function toggleTextMode() {
  var full = document.getElementById('definitionsContainer');
  var text = document.getElementById('textModeContent');
  var button = document.getElementById('textModeToggle');
  var toFull = full.style.display === 'none';
  full.style.display = toFull ? 'block' : 'none';
  text.style.display = toFull ? 'none' : 'block';
  button.textContent = toFull ? 'Switch to Single Mode' : 'Switch to Full Mode';
}
</script>"#;

/// Renders ranked results as the collapsible definition field.
///
/// Each source gets a toggle button: red and collapsed when it holds a
/// guess, yellow and open otherwise. Text mode shows the first confident
/// definition, or the first guess with a warning. `None` when nothing
/// has definitions.
pub fn build_definition_html(results: &SourceResults, text_mode_default: bool) -> Option<String> {
    let text_mode = text_mode_content(results)?;

    let mut container = String::new();
    for (label, entries) in results {
        if PROVIDER_LABELS.contains(&label.as_str()) || entries.is_empty() {
            continue;
        }
        let is_guess = entries.iter().any(|e| e.is_guess());
        let (display, color) = if is_guess { ("none", RED) } else { ("block", YELLOW) };

        let mut sections = String::new();
        for entry in entries {
            let word = entry.display_word();
            let definitions = strip_redundant_heading(
                &as_html(&entry.definitions.join(JOINER)),
                &entry.word,
                &entry.reading,
            );
            let guess_note = if is_guess { "<p>THIS IS A GUESS ENTRY</p>" } else { "" };
            sections.push_str(&format!(
                "<div><p><b>{word}</b>【{}】:<br />{definitions}</p>{guess_note}</div>",
                entry.reading
            ));
        }

        container.push_str(&format!(
            "<button type='button' style='background-color: #{color}; color: #FFF; padding:10px; border-radius: 10px;' \
             onclick=\"toggleDefinition('{label}')\">{label}</button>\
             <div id='{label}' style='display:{display};'>{sections}</div><br />"
        ));
    }

    let (main_display, text_display, mode_label) = if text_mode_default {
        ("none", "block", "Switch to Full Mode")
    } else {
        ("block", "none", "Switch to Single Mode")
    };

    Some(format!(
        "<div class='overall-border'>\
         <button id='textModeToggle' type='button' onclick='toggleTextMode()' \
         style='background-color: #000; color: #FFF; position: relative; top: 4px; right: 4px; float: right; padding:10px; border-radius: 10px;'>{mode_label}</button>\
         <div id='definitionsContainer' style='display:{main_display};'>{container}</div>\
         <div id='textModeContent' style='display:{text_display};'><br/><br/>{text_mode}</div>\
         </div>"
    ))
}

fn text_mode_content(results: &SourceResults) -> Option<String> {
    let entries = || results.values().flatten();

    if let Some(entry) = entries().find(|e| !e.is_guess() && !e.definitions.is_empty()) {
        return Some(as_html(&entry.definitions.join(JOINER)));
    }

    let guess = results
        .values()
        .filter_map(|entries| entries.first())
        .find(|e| !e.definitions.is_empty())?;
    Some(format!("{}{GUESS_WARNING}", as_html(&guess.definitions.join(JOINER))))
}

fn as_html(text: &str) -> String {
    text.replace('\n', "<br />")
}

/// Drops `word【reading】:` style headings the dictionary text repeats
fn strip_redundant_heading(text: &str, word: &str, reading: &str) -> String {
    let mut text = text.to_string();
    for heading in [format!("{word}【{reading}】"), format!("{reading}【{word}】")] {
        for suffix in ["とは、", "とは", ":", "：", ""] {
            text = text.replace(&format!("{heading}{suffix}"), "");
        }
    }
    text
}
