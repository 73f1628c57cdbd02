//! Built-in cases, candidates and vote weights used when no plan file is
//! given.

use extractbench_core::{BenchmarkCase, Candidate, VoteWeights};

fn case(url: &str, link_prompt: &str, questions: &[&str]) -> BenchmarkCase {
    BenchmarkCase::new(url, link_prompt, questions.iter().map(|q| q.to_string()).collect())
}

pub fn cases() -> Vec<BenchmarkCase> {
    vec![
        case(
            "https://www.npmjs.com/search?q=keywords:backend&page=0&ranking=optimal",
            "Find links to npm packages, the format must match https://www.npmjs.com/package/[package-name]",
            &[
                "What is the GitHub URL of this package?",
                "What is the curent version of this package?",
                "How many weekly downloads does this package have? Format: number",
                "What is the unpacked size of this package, in bytes? Format: number",
                "What is the license?",
            ],
        ),
        case(
            "https://en.wikipedia.org/wiki/List_of_Pok%C3%A9mon",
            "Find links to individual Pokemon pages",
            &[
                "What is the name of this Pokemon?",
                "What is the Pokedex index number? Format: 4 digit number with leading zeros",
                "What is the type of this Pokemon?",
                "What is the previous evolution of this Pokemon? Format: name only. Reply N/A if none",
                "What is the next evolution of this Pokemon? Format: name only. Reply N/A if none",
            ],
        ),
        case(
            "https://pokemondb.net/pokedex/all",
            "Find links to individual Pokemon pages",
            &[
                "Name",
                "Number (include leading zeros)",
                "Type",
                "Species",
                "Height (m)",
                "Weight (kg)",
                "Base HP",
                "Base Attack",
                "Base Defense",
                "% Male, Format: XX.X",
                "% Female, Format: XX.X",
            ],
        ),
        case(
            "https://stackoverflow.com/questions?tab=Newest",
            "Find links to questions on StackOverflow. Must have URL format \"stackoverflow.com/questions/{number}\"",
            &[
                "What is the title of the question?",
                "Who is the author of the question?",
                "How many votes does the question have? Format: number",
                "How many answers does the question have? Format: number",
            ],
        ),
        case(
            "https://www.imdb.com/chart/top",
            "Find links to individual movie pages on IMDB. Must have \"/title/\" in the URL.",
            &[
                "What is the title of the movie?",
                "What is the release year of the movie?",
                "What is the IMDB rating of the movie? Format: X.X/10",
                "Who is the director of the movie?",
            ],
        ),
        case(
            "https://medium.com/tag/backend",
            "Find links to articles tagged \"backend\" on Medium",
            &[
                "What is the title of the article?",
                "Who is the author of the article?",
                "How many claps does the article have? Format: number",
                "What is the publication date? Format: YYYY-MM-DD",
            ],
        ),
        case(
            "https://news.ycombinator.com/",
            "Find links to comment pages for each article",
            &[
                "What is the title of the article?",
                "What is the URL of the article?",
                "Who submitted this article?",
                "How many points does the article have? Format: number",
                "How many comments does the article have? Format: number",
            ],
        ),
        case(
            "https://www.gutenberg.org/ebooks/search/?query=science",
            "Find links to science-related books on Project Gutenberg",
            &[
                "What is the title of the book?",
                "Who is the author of the book?",
                "What is the release date of the book? Format: YYYY-MM-DD",
            ],
        ),
        case(
            "https://genius.com/hot-songs",
            "Find links to song pages. Only links to individual, specific songs.",
            &[
                "What is the title of the song?",
                "Who is the artist of the song?",
                "How many views does the song have? Format: number. Expand abbreviations like \"K\" or \"M\"",
                "When was the song released? Format: YYYY-MM-DD",
            ],
        ),
        case(
            "https://old.reddit.com/r/worldnews/",
            "Find links comment pages",
            &[
                "What is the title of the linked article?",
                "What is the domain of the linked article?",
                "What is the full text of the top comment?",
                "Who is the author of the top comment? Username only",
            ],
        ),
    ]
}

const AIS: [&str; 7] = [
    "openai:gpt-4o-mini",
    "openai:gpt-4o",
    "openai:gpt-3.5-turbo",
    "openai:gpt-4",
    "openai:gpt-4-turbo",
    "ollama:codellama:13b",
    "ollama:codellama:34b",
];

const EXTRACTORS: [&str; 1] = ["iterative-prompt"];

/// Every built-in AI paired with every built-in extractor, AI-major.
pub fn candidates() -> Vec<Candidate> {
    AIS.iter()
        .flat_map(|ai| EXTRACTORS.iter().map(move |ex| Candidate::new(*ai, *ex)))
        .collect()
}

pub fn weights() -> VoteWeights {
    VoteWeights::new()
        .with("human", 100)
        .with("openai:gpt-4o/basic", 2)
        .with("openai:gpt-4o-mini/basic", 2)
        .with("openai:gpt-4-turbo/basic", 1)
        .with("openai:gpt-4o/iterative-prompt", 2)
        .with("openai:gpt-4o-mini/iterative-prompt", 2)
        .with("openai:gpt-4-turbo/iterative-prompt", 1)
}
