use super::{Setup, Source, word_or_selection};
use crate::host::{Eol, Host};
use crate::item::Item;
use crate::options::Options;

/// Every non-blank line of the active document
pub struct FileLines;

impl Source for FileLines {
    type Context = ();

    fn placeholder(&self) -> &str {
        "Type to narrow file"
    }

    fn setup(&self, host: &mut dyn Host) -> Setup<()> {
        match host.active_editor() {
            Some(_) => Setup::Ready(()),
            None => Setup::NotApplicable,
        }
    }

    fn prepare_items(&self, host: &mut dyn Host, _context: &()) -> Vec<Item> {
        host.active_editor()
            .map(|editor| line_items(editor.text(), editor.eol()))
            .unwrap_or_default()
    }

    fn initial_search_term(&self, host: &mut dyn Host, _context: &(), options: &Options) -> String {
        host.active_editor()
            .map(|editor| word_or_selection(editor, options))
            .unwrap_or_default()
    }
}

/// One item per physical line, skipping empty and whitespace-only lines.
pub fn line_items(text: &str, eol: Eol) -> Vec<Item> {
    text.split(eol.as_str())
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| Item::line(line, index as u32))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    #[test]
    fn blank_lines_are_dropped() {
        let items = line_items("fn main() {\n\n    \n    run();\n}\n", Eol::Lf);
        let rows: Vec<_> = items
            .iter()
            .map(|item| (item.line_index().unwrap(), item.label.as_str()))
            .collect();
        assert_eq!(rows, vec![(0, "fn main() {"), (3, "    run();"), (4, "}")]);
    }

    #[test]
    fn crlf_lines_keep_no_carriage_return() {
        let items = line_items("a\r\nb\r\n", Eol::CrLf);
        let labels: Vec<_> = items.iter().map(|item| item.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "b"]);
    }

    fn document() -> impl Strategy<Value = (String, Eol)> {
        (
            prop::collection::vec("[ a-z\t]{0,12}", 0..40),
            prop_oneof![Just(Eol::Lf), Just(Eol::CrLf)],
        )
            .prop_map(|(lines, eol)| (lines.join(eol.as_str()), eol))
    }

    proptest! {
        #[test]
        fn one_item_per_non_blank_line((text, eol) in document()) {
            let items = line_items(&text, eol);
            let expected: Vec<(u32, &str)> = text
                .split(eol.as_str())
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(i, line)| (i as u32, line))
                .collect();
            let actual: Vec<(u32, &str)> = items
                .iter()
                .map(|item| (item.line_index().unwrap(), item.label.as_str()))
                .collect();
            prop_assert_eq!(actual, expected);
            prop_assert!(items.iter().all(|item| !item.label.trim().is_empty()));
        }

        #[test]
        fn splitting_on_detected_eol_round_trips((text, _) in document()) {
            let eol = Eol::detect(&text);
            let rejoined = text.split(eol.as_str()).collect::<Vec<_>>().join(eol.as_str());
            prop_assert_eq!(rejoined, text);
        }
    }
}
