// Built-in automata for URL classification
//
// Each automaton runs over a small alphabet of character classes rather
// than raw characters. Characters that map to no class are fed as OUTSIDE,
// which is never part of an alphabet, so the run halts with
// RejectedInvalidSymbol at that position.

use vigil_automaton::{Automaton, AutomatonResult, ExecutionResult, Simulator};

/// Symbol fed for characters outside every class
pub const OUTSIDE: char = '\u{0}';

/// An automaton paired with its character class mapping
#[derive(Debug, Clone)]
pub struct ClassAutomaton {
    automaton: Automaton,
    classify: fn(char) -> Option<char>,
}

impl ClassAutomaton {
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Run over the class stream of `input`
    pub fn run(&self, simulator: &Simulator, input: &str) -> ExecutionResult {
        let classify = self.classify;
        simulator.run_symbols(
            &self.automaton,
            input.chars().map(|c| classify(c).unwrap_or(OUTSIDE)),
        )
    }
}

/// Byte offset and character at a symbol position of `input`
pub fn char_at(input: &str, position: usize) -> Option<(usize, char)> {
    input.char_indices().nth(position)
}

const PCHAR: &[char] = &['A', 'D', '+', '-', '.', 'U', 'S', '%', ':', '@'];

fn grammar_class(c: char) -> Option<char> {
    match c {
        'a'..='z' | 'A'..='Z' => Some('A'),
        '0'..='9' => Some('D'),
        '+' | '-' | '.' | ':' | '/' | '?' | '#' | '@' | '%' | '[' | ']' => Some(c),
        '_' | '~' => Some('U'),
        '!' | '$' | '&' | '\'' | '(' | ')' | '*' | ',' | ';' | '=' => Some('S'),
        _ => None,
    }
}

/// URL grammar: scheme ":" [ "//" authority ] path [ "?" query ] [ "#" fragment ]
pub fn url_grammar() -> AutomatonResult<ClassAutomaton> {
    let pchar = PCHAR.iter().copied();
    let automaton = Automaton::builder()
        .states([
            "start",
            "scheme",
            "colon",
            "slash",
            "authority",
            "path",
            "opaque",
            "query",
            "fragment",
        ])
        .symbols(pchar.clone())
        .symbols(['/', '?', '#', '[', ']'])
        .start("start")
        .accepting_states(["authority", "path", "opaque", "query", "fragment"])
        .transition("start", 'A', "scheme")
        .transitions_on("scheme", ['A', 'D', '+', '-', '.'], "scheme")
        .transition("scheme", ':', "colon")
        .transition("colon", '/', "slash")
        .transitions_on("colon", pchar.clone(), "opaque")
        .transition("colon", '?', "query")
        .transition("colon", '#', "fragment")
        .transition("slash", '/', "authority")
        .transitions_on("slash", pchar.clone(), "path")
        .transition("slash", '?', "query")
        .transition("slash", '#', "fragment")
        .transitions_on("authority", pchar.clone(), "authority")
        .transitions_on("authority", ['[', ']'], "authority")
        .transition("authority", '/', "path")
        .transition("authority", '?', "query")
        .transition("authority", '#', "fragment")
        .transitions_on("path", pchar.clone(), "path")
        .transition("path", '/', "path")
        .transition("path", '?', "query")
        .transition("path", '#', "fragment")
        .transitions_on("opaque", pchar.clone(), "opaque")
        .transition("opaque", '/', "opaque")
        .transition("opaque", '?', "query")
        .transition("opaque", '#', "fragment")
        .transitions_on("query", pchar.clone(), "query")
        .transitions_on("query", ['/', '?'], "query")
        .transition("query", '#', "fragment")
        .transitions_on("fragment", pchar, "fragment")
        .transitions_on("fragment", ['/', '?'], "fragment")
        .build()?;

    Ok(ClassAutomaton {
        automaton,
        classify: grammar_class,
    })
}

fn percent_class(c: char) -> Option<char> {
    match c {
        '%' => Some('%'),
        c if c.is_ascii_hexdigit() => Some('h'),
        _ => Some('o'),
    }
}

/// Percent-encoding validity: every `%` is followed by two hex digits
pub fn percent_encoding() -> AutomatonResult<ClassAutomaton> {
    let automaton = Automaton::builder()
        .states(["text", "percent", "first_hex"])
        .symbols(['%', 'h', 'o'])
        .start("text")
        .accepting("text")
        .transitions_on("text", ['h', 'o'], "text")
        .transition("text", '%', "percent")
        .transition("percent", 'h', "first_hex")
        .transition("first_hex", 'h', "text")
        .build()?;

    Ok(ClassAutomaton {
        automaton,
        classify: percent_class,
    })
}

fn hostname_class(c: char) -> Option<char> {
    match c {
        '-' | '.' => Some(c),
        c if c.is_alphanumeric() => Some('a'),
        _ => None,
    }
}

/// Hostname labels: alphanumeric runs joined by inner hyphens, separated
/// by single dots, optional trailing dot
pub fn hostname() -> AutomatonResult<ClassAutomaton> {
    let automaton = Automaton::builder()
        .states(["start", "label", "hyphen", "dot"])
        .symbols(['a', '-', '.'])
        .start("start")
        .accepting_states(["label", "dot"])
        .transition("start", 'a', "label")
        .transition("label", 'a', "label")
        .transition("label", '-', "hyphen")
        .transition("label", '.', "dot")
        .transition("hyphen", '-', "hyphen")
        .transition("hyphen", 'a', "label")
        .transition("dot", 'a', "label")
        .build()?;

    Ok(ClassAutomaton {
        automaton,
        classify: hostname_class,
    })
}

/// Trie automaton accepting exactly the given words
pub fn keyword_set<S: AsRef<str>>(words: &[S]) -> AutomatonResult<Automaton> {
    let mut builder = Automaton::builder().state("^").start("^");

    for word in words {
        let word = word.as_ref();
        let mut prev = "^".to_string();
        for (i, c) in word.char_indices() {
            let next = format!("^{}", &word[..i + c.len_utf8()]);
            builder = builder
                .symbol(c)
                .state(next.clone())
                .transition(prev, c, next.clone());
            prev = next;
        }
        builder = builder.accepting(prev);
    }

    builder.build()
}
