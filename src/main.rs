extern crate dayreader;

extern crate ansi_term;
extern crate clap;
extern crate env_logger;
#[macro_use]
extern crate error_chain;
#[macro_use]
extern crate log;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use ansi_term::{Colour, Style};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};

use dayreader::config::Config;
use dayreader::content::{ContentSource, DisplayState};
use dayreader::errors::*;
use dayreader::progress::{self, Progress};
use dayreader::store::FileStore;
use dayreader::{LocationRef, Session};

/// Describes all the styles that can be used in printing text.
/// Mostly just good for disabling custom formatting.
#[derive(Debug, Clone)]
struct StyleSet {
    /// Normal text
    normal: Style,
    /// Position headers and day names
    title: Style,
    /// Translations and labels
    description: Style,
    /// Completion marks
    done: Style,
    /// Error text
    error: Style,
}

impl StyleSet {
    /// Preset for the --no-ansi option (no style)
    fn no_ansi() -> StyleSet {
        StyleSet {
            normal: Style::new(),
            title: Style::new(),
            description: Style::new(),
            done: Style::new(),
            error: Style::new(),
        }
    }

    /// Preset for the normal "fancy" style
    fn fancy() -> StyleSet {
        StyleSet {
            normal: Style::new(),
            title: Colour::White.bold(),
            description: Style::new().italic(),
            done: Colour::Green.normal(),
            error: Colour::Red.normal(),
        }
    }
}

/// Returns styled text (using a format string syntax)
macro_rules! style {
    ($style:expr, $($arg:tt)*) => {
        {{
            $style.paint(format!( $($arg)*) )
        }}
    }
}

/// Prints a line of text in the given style
macro_rules! styleln {
    ($style:expr, $($arg:tt)*) => {
        println!("{}", style!($style, $($arg)*))
    }
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let reference_arg = || {
        Arg::with_name("REFERENCE")
            .help("A shareable location reference, e.g. 'day=3' or a whole link")
    };

    let matches = App::new("dayreader")
        .version("0.1.0")
        .author("Ian Johnson <ianprime0509@gmail.com>")
        .about("Follows a 27-day reading plan one sub-unit at a time")
        .setting(AppSettings::ColoredHelp)
        .arg(Arg::with_name("no-ansi")
            .help("Disables fancy text output")
            .short("n")
            .long("no-ansi"))
        .arg(Arg::with_name("data-dir")
            .help("The directory holding persisted state")
            .long("data-dir")
            .value_name("DIR")
            .takes_value(true))
        .arg(Arg::with_name("plan")
            .help("A plan table to use instead of the bundled one")
            .long("plan")
            .value_name("FILE")
            .takes_value(true))
        .arg(Arg::with_name("content")
            .help("A directory of content files, laid out as SECTION/SUBUNIT.json")
            .long("content")
            .value_name("DIR")
            .takes_value(true))
        .subcommand(SubCommand::with_name("read")
            .about("Reads interactively, starting from the last day read")
            .arg(reference_arg())
            .after_help("Commands: n [COUNT] (next), p [COUNT] (previous), day DAY, \
                         go SECTION:SUBUNIT, ref REFERENCE, done (mark the day complete), \
                         mark (bookmark the current sub-unit), link, q (quit)."))
        .subcommand(SubCommand::with_name("play")
            .about("Reads hands-free, advancing after a fixed delay")
            .arg(reference_arg())
            .arg(Arg::with_name("delay")
                .short("d")
                .long("delay")
                .value_name("SECS")
                .default_value("5")
                .help("Seconds to wait after each sub-unit")
                .takes_value(true))
            .arg(Arg::with_name("count")
                .short("c")
                .long("count")
                .value_name("COUNT")
                .default_value("10")
                .help("The number of sub-units to read")
                .takes_value(true)))
        .subcommand(SubCommand::with_name("days").about("Lists the days of the plan"))
        .subcommand(SubCommand::with_name("link")
            .about("Prints the shareable reference for the last day read"))
        .subcommand(SubCommand::with_name("complete")
            .about("Marks a day as complete")
            .arg(Arg::with_name("DAY")
                .help("The day to mark")
                .required(true)))
        .subcommand(SubCommand::with_name("uncomplete")
            .about("Clears the completion mark of a day")
            .arg(Arg::with_name("DAY")
                .help("The day to clear")
                .required(true)))
        .subcommand(SubCommand::with_name("progress").about("Summarizes reading progress"))
        .subcommand(SubCommand::with_name("bookmarks").about("Lists bookmarks"))
        .subcommand(SubCommand::with_name("unbookmark")
            .about("Removes a bookmark")
            .arg(Arg::with_name("ID")
                .help("The bookmark id, e.g. 2-255")
                .required(true)))
        .after_help("dayreader remembers the last day read. Use `dayreader read` to pick up \
                     where you left off, or pass a reference such as 'day=12' to jump there.")
        .get_matches();

    // Whether we should disable the fancy ANSI terminal text
    let no_ansi = matches.is_present("no-ansi");
    // The style to use
    let style_set = if no_ansi {
        StyleSet::no_ansi()
    } else {
        StyleSet::fancy()
    };

    // Handle errors nicely
    if let Err(ref e) = run(&matches, &style_set) {
        styleln!(style_set.error, "Error: {}", e);

        for e in e.iter().skip(1) {
            styleln!(style_set.error, "Caused by: {}", e);
        }

        if let Some(backtrace) = e.backtrace() {
            styleln!(style_set.error, "Backtrace: {:?}", backtrace);
        }

        std::process::exit(1);
    }
}

/// The main program logic.
/// Each subcommand should do its own printing, except for errors, which are returned.
fn run(m: &ArgMatches, style_set: &StyleSet) -> Result<()> {
    let config = Config {
        data_dir: m.value_of("data-dir").map(PathBuf::from),
        plan_file: m.value_of("plan").map(PathBuf::from),
        content_dir: m.value_of("content").map(PathBuf::from),
    };

    match m.subcommand() {
        ("read", Some(sub_m)) => read(&config, sub_m, style_set),
        ("play", Some(sub_m)) => play(&config, sub_m, style_set),
        ("days", Some(_)) => days(&config, style_set),
        ("link", Some(_)) => link(&config, style_set),
        ("complete", Some(sub_m)) => complete(&config, sub_m, style_set, true),
        ("uncomplete", Some(sub_m)) => complete(&config, sub_m, style_set, false),
        ("progress", Some(_)) => show_progress(&config, style_set),
        ("bookmarks", Some(_)) => list_bookmarks(&config, style_set),
        ("unbookmark", Some(sub_m)) => unbookmark(&config, sub_m, style_set),
        _ => show_progress(&config, style_set),
    }
}

/// Returns the value of an argument clap has already checked is present.
fn required<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    match m.value_of(name) {
        Some(v) => Ok(v),
        None => bail!("missing argument {}", name),
    }
}

fn parse_count(m: &ArgMatches, name: &str) -> Result<u32> {
    required(m, name)?
        .parse()
        .chain_err(|| format!("invalid numeric argument to `--{}`", name))
}

fn open_session(config: &Config, m: &ArgMatches) -> Result<Session<FileStore>> {
    let plan = config.load_plan()?;
    let store = config.open_store()?;
    let reference = m.value_of("REFERENCE").map(LocationRef::parse);
    Ok(Session::start(plan, store, reference))
}

/// Fetches content for the pending request (if any) and prints the
/// current sub-unit.
fn show(session: &mut Session<FileStore>, source: &mut dyn ContentSource, style_set: &StyleSet) {
    if let Some(request) = session.pending() {
        let result = request.fetch(source);
        session.deliver(&request, result, Instant::now());
    }

    let p = session.position();
    let bookmark = if session.is_current_bookmarked() { " *" } else { "" };
    println!("{} {}",
             style!(style_set.title, "Day {}, {}:{}{}", p.day, p.section, p.sub_unit, bookmark),
             style!(style_set.normal, "({})", session.reference()));
    match *session.display() {
        DisplayState::Ready(ref c) => {
            if !c.section_name.is_empty() {
                styleln!(style_set.description, "{}", c.section_name);
            }
            if !c.text.is_empty() {
                styleln!(style_set.normal, "{}", c.text);
            }
            if !c.translation.is_empty() {
                styleln!(style_set.description, "{}", c.translation);
            }
            if let Some(audio) = c.recitation() {
                styleln!(style_set.normal, "Recitation ({}): {}", audio.reciter, audio.url);
            }
        }
        DisplayState::Failed(_) | DisplayState::Pending(_) | DisplayState::Empty => {
            styleln!(style_set.description, "(no content available)");
        }
    }
    if session.is_at_end() {
        styleln!(style_set.normal, "End of plan.");
    }
}

/// The `read` subcommand logic: a line-oriented loop over stdin.
fn read(config: &Config, m: &ArgMatches, style_set: &StyleSet) -> Result<()> {
    let mut session = open_session(config, m)?;
    let mut source = config.content_source();
    show(&mut session, &mut *source, style_set);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().chain_err(|| ErrorKind::Io("could not write prompt".into()))?;

        let mut line = String::new();
        let read = stdin.lock()
            .read_line(&mut line)
            .chain_err(|| ErrorKind::Io("could not read command".into()))?;
        if read == 0 {
            break;
        }
        let mut words = line.split_whitespace();
        let command = match words.next() {
            Some(c) => c,
            None => continue,
        };
        let arg = words.next();

        let outcome = match command {
            "q" | "quit" => break,
            "n" | "next" => arg.unwrap_or("1").parse::<u32>()
                .chain_err(|| "invalid count")
                .map(|count| { session.next_by(count); }),
            "p" | "previous" => arg.unwrap_or("1").parse::<u32>()
                .chain_err(|| "invalid count")
                .map(|count| { session.previous_by(count); }),
            "day" => arg.unwrap_or("").parse::<u32>()
                .chain_err(|| "invalid day")
                .and_then(|day| session.jump_to_day(day))
                .map(|_| ()),
            "go" => parse_unit(arg.unwrap_or(""))
                .and_then(|(section, sub_unit)| session.jump_to_unit(section, sub_unit))
                .map(|_| ()),
            "ref" => session.jump_to_reference(&LocationRef::parse(arg.unwrap_or(""))).map(|_| ()),
            "done" => {
                let day = session.position().day;
                session.mark_complete(day).map(|_| {
                    styleln!(style_set.done, "Marked day {} complete", day);
                })
            }
            "mark" => session.bookmark_current().map(|b| {
                styleln!(style_set.normal, "Bookmarked {}", b.id);
            }),
            "link" => {
                styleln!(style_set.normal, "{}", session.reference());
                continue;
            }
            other => {
                styleln!(style_set.error, "Unknown command '{}' (try n, p, day, go, ref, done, mark, link, q)", other);
                continue;
            }
        };

        match outcome {
            Ok(()) => show(&mut session, &mut *source, style_set),
            Err(e) => styleln!(style_set.error, "{}", e),
        }
    }

    if !session.is_durable() {
        styleln!(style_set.error, "Warning: progress could not be saved this session");
    }
    Ok(())
}

/// Parses `SECTION:SUBUNIT`.
fn parse_unit(s: &str) -> Result<(u32, u32)> {
    let mut parts = s.splitn(2, ':');
    let section = parts.next().unwrap_or("").parse().chain_err(|| "invalid section")?;
    let sub_unit = parts.next().unwrap_or("").parse().chain_err(|| "invalid sub-unit")?;
    Ok((section, sub_unit))
}

/// The `play` subcommand logic.
fn play(config: &Config, m: &ArgMatches, style_set: &StyleSet) -> Result<()> {
    let delay = parse_count(m, "delay")?;
    let count = parse_count(m, "count")?;

    let mut session = open_session(config, m)?;
    let mut source = config.content_source();
    session.enable_auto_advance(Duration::from_secs(delay as u64));

    for n in 0..count {
        show(&mut session, &mut *source, style_set);
        if n + 1 == count || session.is_at_end() {
            break;
        }
        // Content that failed to load never arms the timer; move on anyway
        let deadline = session.auto_advance_deadline()
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(delay as u64));
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        if session.tick(Instant::now()).is_none() {
            session.next();
        }
    }

    session.close();
    Ok(())
}

/// The `days` subcommand logic.
fn days(config: &Config, style_set: &StyleSet) -> Result<()> {
    let plan = config.load_plan()?;
    let store = config.open_store()?;
    let progress = Progress::load(&store, &plan);
    let current = progress::load_last_day(&store);

    for entry in plan.days() {
        let ranges: Vec<String> = entry.segments()
            .iter()
            .map(|s| format!("{}:{}-{}", s.section(), s.range_start(), s.range_end()))
            .collect();
        let mark = if progress.is_complete(entry.day()) {
            style!(style_set.done, "done")
        } else if Some(entry.day()) == current {
            style!(style_set.normal, "current")
        } else {
            style!(style_set.normal, "")
        };
        println!("{} {} {}",
                 style!(style_set.title, "Day {:>2}", entry.day()),
                 style!(style_set.description, "{:<30}", ranges.join(", ")),
                 mark);
    }
    Ok(())
}

/// The `link` subcommand logic.
fn link(config: &Config, style_set: &StyleSet) -> Result<()> {
    let plan = config.load_plan()?;
    let store = config.open_store()?;
    let day = progress::load_last_day(&store).unwrap_or(1);
    let start = plan.day_start(day).or_else(|_| plan.day_start(1))?;
    styleln!(style_set.normal, "{}", dayreader::sync::reference_for(&plan, &start));
    Ok(())
}

/// The `complete` and `uncomplete` subcommand logic.
fn complete(config: &Config, m: &ArgMatches, style_set: &StyleSet, mark: bool) -> Result<()> {
    let day = parse_count(m, "DAY")?;
    let plan = config.load_plan()?;
    let mut store = config.open_store()?;

    let changed = if mark {
        progress::mark_complete(&mut store, &plan, day)?
    } else {
        progress::unmark_complete(&mut store, &plan, day)?
    };
    match (mark, changed) {
        (true, true) => styleln!(style_set.done, "Marked day {} complete", day),
        (true, false) => styleln!(style_set.normal, "Day {} was already complete", day),
        (false, true) => styleln!(style_set.normal, "Cleared day {}", day),
        (false, false) => styleln!(style_set.normal, "Day {} was not complete", day),
    }
    Ok(())
}

/// The `progress` subcommand logic.
fn show_progress(config: &Config, style_set: &StyleSet) -> Result<()> {
    let plan = config.load_plan()?;
    let store = config.open_store()?;
    let progress = Progress::load(&store, &plan);

    println!("{} {}",
             style!(style_set.title, "{} of {} days complete", progress.completed_count(), progress.total_days),
             style!(style_set.normal, "({}%)", progress.percent()));
    styleln!(style_set.normal, "Current run: {} days", progress.current_run());
    styleln!(style_set.normal, "Longest run: {} days", progress.longest_run());
    match progress.next_unread() {
        Some(day) => styleln!(style_set.normal, "Next day to read: {}", day),
        None => styleln!(style_set.done, "Plan complete"),
    }
    if let Some(day) = progress::load_last_day(&store) {
        styleln!(style_set.description, "Last read: day {}", day);
    }
    Ok(())
}

/// The `bookmarks` subcommand logic.
fn list_bookmarks(config: &Config, style_set: &StyleSet) -> Result<()> {
    let plan = config.load_plan()?;
    let store = config.open_store()?;
    let bookmarks = dayreader::bookmarks::list(&store);

    if bookmarks.is_empty() {
        styleln!(style_set.normal,
                 "No bookmarks yet; use `mark` while reading with `dayreader read` to add one");
        return Ok(());
    }
    for b in bookmarks {
        let day = plan.entry_containing(b.section, b.sub_unit).map(|e| e.day()).ok();
        println!("{} {} {}",
                 style!(style_set.title, "{:<8}", b.id),
                 style!(style_set.normal, "{}", match day {
                     Some(d) => format!("day {}", d),
                     None => "not in plan".to_owned(),
                 }),
                 style!(style_set.description, "{}", b.created.format("%B %-d, %Y")));
    }
    Ok(())
}

/// The `unbookmark` subcommand logic.
fn unbookmark(config: &Config, m: &ArgMatches, style_set: &StyleSet) -> Result<()> {
    let id = required(m, "ID")?;
    let mut store = config.open_store()?;

    if dayreader::bookmarks::remove(&mut store, id)? {
        styleln!(style_set.normal, "Removed bookmark {}", id);
    } else {
        debug!("no bookmark with id {}", id);
        styleln!(style_set.normal, "No bookmark {}", id);
    }
    Ok(())
}
