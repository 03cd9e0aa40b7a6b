// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! CREATE statement rewriter
//!
//! mysqldump writes one column or key per line, so a CREATE statement spans
//! many lines. The rewriter filters it word by word against the rule set and
//! carries its state from one line to the next until a line ends in `;`.
//!
//! Commas are never written as they are read. A comma only marks that the
//! next emitted token needs one in front of it, so a field dropped in its
//! entirety (a `KEY` line, say) leaves no dangling separator behind.

use crate::config::RuleSet;
use crate::tokenizer::{Token, Tokenizer};

#[derive(Debug, Default)]
pub struct CreateRewriter {
    open: bool,
    skip_next: bool,
    comma_pending: bool,
}

impl CreateRewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A CREATE line was seen; following lines belong to it until one ends in `;`.
    pub fn start(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Rewrite one line of the open statement, returning the text to emit.
    pub fn rewrite_line(&mut self, line: &str, rules: &RuleSet) -> String {
        self.open = !line.ends_with(';');
        let mut out = String::with_capacity(line.len());

        for token in Tokenizer::new(line) {
            match token {
                Token::Comma => {
                    self.skip_next = false;
                    self.comma_pending = true;
                    continue;
                }
                Token::Word(_)
                | Token::Number(_)
                | Token::SingleQuotedString(_)
                | Token::LParen
                | Token::RParen => {}
                // `=`, `;`, whitespace and comments never reach the output
                _ => continue,
            }

            if self.skip_next {
                self.skip_next = false;
                continue;
            }

            let text = token.to_string();
            if rules.skip_clauses.contains(&text) {
                self.comma_pending = false;
                break;
            }
            if rules.skip_words.contains(&text) {
                self.skip_next = true;
            }
            if rules.drop_words.contains(&text) {
                continue;
            }

            if self.comma_pending {
                self.comma_pending = false;
                if token != Token::RParen {
                    out.push_str(", ");
                }
            }
            out.push_str(&text);
            out.push(' ');
        }

        if !self.open {
            out.push_str(";\n");
            self.skip_next = false;
            self.comma_pending = false;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn rules() -> RuleSet {
        RuleSet::builtin().unwrap()
    }

    fn rewrite_all(lines: &[&str], rules: &RuleSet) -> String {
        let mut rewriter = CreateRewriter::new();
        rewriter.start();
        let mut out = String::new();
        for line in lines {
            out.push_str(&rewriter.rewrite_line(line, rules));
        }
        assert!(!rewriter.is_open());
        out
    }

    #[test]
    fn test_single_line_statement() {
        let rules = RuleSet::from_yaml_str(
            "DropWords: [unsigned, COMMENT, ENGINE]\nSkipWords: [COMMENT, ENGINE]\nFlagOK: true\n",
        )
        .unwrap();
        let out = rewrite_all(
            &["CREATE TABLE `t1` (`id` int unsigned COMMENT 'x', `name` varchar(10)) ENGINE=InnoDB;"],
            &rules,
        );
        assert_eq!(out, "CREATE TABLE `t1` ( `id` int , `name` varchar ( 10 ) ) ;\n");
    }

    #[test]
    fn test_mysqldump_table() {
        let out = rewrite_all(
            &[
                "CREATE TABLE `tcustomerdocs` (",
                "  `id` int(10) unsigned NOT NULL AUTO_INCREMENT,",
                "  `plan` int(11) NOT NULL DEFAULT '0',",
                "  `scanned` date DEFAULT NULL,",
                "  `note` varchar(200) DEFAULT NULL COMMENT 'free text, anything',",
                "  `price` decimal(10,2) DEFAULT '0.00',",
                "  PRIMARY KEY (`id`),",
                "  KEY `plan` (`plan`)",
                ") ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=latin1;",
            ],
            &rules(),
        );
        assert_eq!(
            out,
            "CREATE TABLE `tcustomerdocs` ( \
             `id` int ( 10 ) \
             , `plan` int ( 11 ) \
             , `scanned` date \
             , `note` varchar ( 200 ) \
             , `price` decimal ( 10 , 2 ) \
             ) ;\n"
        );
    }

    #[test]
    fn test_no_dangling_commas() {
        let out = rewrite_all(
            &[
                "CREATE TABLE `t` (",
                "  `a` int,",
                "  UNIQUE KEY `a` (`a`),",
                "  KEY `b` (`a`)",
                ");",
            ],
            &rules(),
        );
        assert!(!out.contains(", ,"));
        assert!(!out.contains(", )"));
        assert_eq!(out, "CREATE TABLE `t` ( `a` int ) ;\n");
    }

    #[test]
    fn test_comma_before_paren_is_dropped() {
        let out = rewrite_all(&["CREATE TABLE `t` (`a` int, COMMENT 'x');"], &rules());
        assert_eq!(out, "CREATE TABLE `t` ( `a` int ) ;\n");
    }

    #[test]
    fn test_skip_word_consumes_next_token_across_lines() {
        let rules = RuleSet::from_yaml_str("SkipWords: [DEFAULT]\nDropWords: [DEFAULT]\nFlagOK: true\n").unwrap();
        let mut rewriter = CreateRewriter::new();
        rewriter.start();
        assert_eq!(rewriter.rewrite_line("CREATE TABLE `t` (`a` int DEFAULT", &rules), "CREATE TABLE `t` ( `a` int ");
        assert!(rewriter.is_open());
        assert_eq!(rewriter.rewrite_line("'5' NOT NULL);", &rules), "NOT NULL ) ;\n");
        assert!(!rewriter.is_open());
    }

    #[test]
    fn test_comma_clears_skip() {
        let rules = RuleSet::from_yaml_str("SkipWords: [COMMENT]\nDropWords: [COMMENT]\nFlagOK: true\n").unwrap();
        let out = rewrite_all(&["CREATE TABLE `t` (`a` int COMMENT, `b` int);"], &rules);
        assert_eq!(out, "CREATE TABLE `t` ( `a` int , `b` int ) ;\n");
    }

    #[test]
    fn test_state_resets_between_statements() {
        let rules = rules();
        let mut rewriter = CreateRewriter::new();
        rewriter.start();
        rewriter.rewrite_line("CREATE TABLE `a` (`x` int DEFAULT;", &rules);
        assert!(!rewriter.is_open());
        rewriter.start();
        assert_eq!(
            rewriter.rewrite_line("CREATE TABLE `b` (`y` int);", &rules),
            "CREATE TABLE `b` ( `y` int ) ;\n"
        );
    }

    const TYPES: [&str; 4] = ["int(11)", "varchar(40)", "date", "longblob"];
    const MODIFIERS: [&str; 5] = [
        "unsigned",
        "NOT NULL",
        "DEFAULT NULL",
        "DEFAULT '0'",
        "COMMENT 'a, (b)'",
    ];
    const KEYS: [&str; 3] = [
        "PRIMARY KEY (`c0`)",
        "UNIQUE KEY `u` (`c0`,`c1`)",
        "KEY `k` (`c0`)",
    ];

    fn column_line(ix: usize, (ty, modifiers): &(usize, Vec<usize>)) -> String {
        let mut line = format!("  `c{}` {}", ix, TYPES[*ty]);
        for m in modifiers {
            line.push(' ');
            line.push_str(MODIFIERS[*m]);
        }
        line
    }

    proptest! {
        #[test]
        fn prop_commas_only_between_kept_columns(
            columns in prop::collection::vec((0..TYPES.len(), prop::collection::vec(0..MODIFIERS.len(), 0..3)), 1..8),
            keys in prop::collection::vec(0..KEYS.len(), 0..4),
        ) {
            let mut entries: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(ix, column)| column_line(ix, column))
                .collect();
            entries.extend(keys.iter().map(|k| format!("  {}", KEYS[*k])));
            let count = entries.len();
            let mut lines = vec!["CREATE TABLE `t` (".to_string()];
            for (n, entry) in entries.into_iter().enumerate() {
                lines.push(if n + 1 < count { entry + "," } else { entry });
            }
            lines.push(") ENGINE=InnoDB AUTO_INCREMENT=42 DEFAULT CHARSET=latin1;".to_string());

            let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
            let out = rewrite_all(&lines, &rules());
            let words: Vec<&str> = out.split_whitespace().collect();

            prop_assert_eq!(words.iter().filter(|w| **w == ",").count(), columns.len() - 1);
            for pair in words.windows(2) {
                prop_assert!(!(pair[0] == "," && matches!(pair[1], "," | ")" | ";")), "{}", out);
                prop_assert!(!(pair[0] == "(" && pair[1] == ","), "{}", out);
            }
            prop_assert!(out.ends_with(") ;\n"), "{}", out);
        }
    }
}
