fn main() {
    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    if argv.iter().any(|t| t == "--help" || t == "-h") {
        println!("{}", markerlamp::help::help_text());
        return;
    }
    let parsed = match markerlamp::args::derive_args(&argv) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let repo_root = parsed.workspace_root.as_ref().map_or_else(
        || markerlamp::config::find_repo_root(&cwd),
        std::path::PathBuf::from,
    );
    if parsed.ci {
        unsafe { std::env::set_var("CI", "1") };
    }
    if parsed.watch && parsed.ci {
        eprintln!("markerlamp: --watch is not allowed with --ci");
        std::process::exit(2);
    }
    if parsed.verbose {
        eprintln!(
            "markerlamp: repo_root={} watch={} ci={} json={}",
            repo_root.to_string_lossy(),
            parsed.watch,
            parsed.ci,
            parsed.json
        );
    }

    let mut run_once = || markerlamp::run::run_report(&repo_root, &parsed);

    let code = if parsed.watch {
        markerlamp::watch::run_polling_watch_loop(
            std::time::Duration::from_millis(800),
            parsed.verbose,
            || markerlamp::run::watch_paths(&repo_root, &parsed),
            &mut run_once,
        )
    } else {
        run_once()
    };
    std::process::exit(code);
}
