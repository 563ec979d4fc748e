use git2::{Repository, Signature};
use licyear_lib::domain::{LocalSync, RepositoryRef};
use licyear_lib::infrastructure::{GitError, GitSync};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LICENSE: &str = "MIT License\n\nCopyright (c) 2024 Jane Doe\n";

/// Create a bare repository under `root` holding one commit with a LICENSE file
fn seed_remote(root: &Path) -> PathBuf {
    let seed_path = root.join("seed");
    let remote_path = root.join("remote.git");

    let seed = Repository::init(&seed_path).unwrap();
    fs::write(seed_path.join("LICENSE"), LICENSE).unwrap();
    let mut index = seed.index().unwrap();
    index.add_path(Path::new("LICENSE")).unwrap();
    index.write().unwrap();
    let tree = seed.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Test", "test@example.com").unwrap();
    seed.commit(Some("HEAD"), &signature, &signature, "initial", &tree, &[])
        .unwrap();
    let branch = seed.head().unwrap().name().unwrap().to_owned();

    Repository::init_bare(&remote_path).unwrap();
    let mut remote = seed
        .remote("origin", remote_path.to_str().unwrap())
        .unwrap();
    remote
        .push(&[format!("{branch}:{branch}")], None)
        .unwrap();
    Repository::open_bare(&remote_path)
        .unwrap()
        .set_head(&branch)
        .unwrap();

    remote_path
}

fn repo_ref(clone_url: &Path) -> RepositoryRef {
    RepositoryRef::new("octocat", "hello", clone_url.to_str().unwrap())
}

fn head_message(remote_path: &Path) -> String {
    let bare = Repository::open_bare(remote_path).unwrap();
    let head = bare.head().unwrap().peel_to_commit().unwrap();
    head.message().unwrap().to_owned()
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

#[test]
fn sync_pushes_a_second_commit_and_removes_the_clone() {
    let temp = TempDir::new().unwrap();
    let remote_path = seed_remote(temp.path());
    let clone_root = temp.path().join("clones");
    let sync = GitSync::new(clone_root.clone(), None);

    sync.sync(&repo_ref(&remote_path), "LICENSE", "Update LICENSE to 2024")
        .unwrap();

    let bare = Repository::open_bare(&remote_path).unwrap();
    let head = bare.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message(), Some("Update LICENSE to 2024"));
    let parent = head.parent(0).unwrap();
    assert_eq!(parent.message(), Some("initial"));
    // The content already matches, so the pushed commit repeats its parent's tree
    assert_eq!(head.tree_id(), parent.tree_id());

    assert!(is_empty_dir(&clone_root));
}

#[test]
fn clone_failure_leaves_no_directory_behind() {
    let temp = TempDir::new().unwrap();
    let clone_root = temp.path().join("clones");
    let sync = GitSync::new(clone_root.clone(), None);

    let result = sync.sync(
        &repo_ref(&temp.path().join("missing.git")),
        "LICENSE",
        "Update LICENSE to 2024",
    );

    assert!(matches!(result, Err(GitError::Clone { .. })));
    assert!(is_empty_dir(&clone_root));
}

#[test]
fn staging_a_missing_path_fails_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let remote_path = seed_remote(temp.path());
    let clone_root = temp.path().join("clones");
    let sync = GitSync::new(clone_root.clone(), None);

    let result = sync.sync(&repo_ref(&remote_path), "NO_SUCH_FILE", "Update to 2024");

    match result {
        Err(GitError::Stage { path, .. }) => assert_eq!(path, "NO_SUCH_FILE"),
        other => panic!("expected stage failure, got {other:?}"),
    }
    assert_eq!(head_message(&remote_path), "initial");
    assert!(is_empty_dir(&clone_root));
}

#[test]
fn unusable_clone_root_is_reported() {
    let temp = TempDir::new().unwrap();
    let remote_path = seed_remote(temp.path());
    let clone_root = temp.path().join("not-a-dir");
    fs::write(&clone_root, "").unwrap();
    let sync = GitSync::new(clone_root, None);

    let result = sync.sync(&repo_ref(&remote_path), "LICENSE", "Update LICENSE to 2024");

    assert!(matches!(result, Err(GitError::CloneRoot { .. })));
    assert_eq!(head_message(&remote_path), "initial");
}

#[test]
fn local_clone_is_removed_when_dropped() {
    let temp = TempDir::new().unwrap();
    let remote_path = seed_remote(temp.path());
    let sync = GitSync::new(temp.path().join("clones"), None);

    let clone = sync.clone_repository(&repo_ref(&remote_path)).unwrap();
    let path = clone.path().to_path_buf();
    assert!(path.starts_with(sync.clone_root()));
    assert_eq!(fs::read_to_string(path.join("LICENSE")).unwrap(), LICENSE);

    drop(clone);
    assert!(!path.exists());
}

#[test]
fn rejected_push_leaves_remote_untouched_and_cleans_up() {
    let temp = TempDir::new().unwrap();
    let remote_path = seed_remote(temp.path());
    let clone_root = temp.path().join("clones");
    let sync = GitSync::new(clone_root.clone(), None);

    // A held ref lock makes the remote refuse the update
    let branch = Repository::open_bare(&remote_path)
        .unwrap()
        .head()
        .unwrap()
        .name()
        .unwrap()
        .to_owned();
    fs::write(remote_path.join(format!("{branch}.lock")), "").unwrap();

    let result = sync.sync(&repo_ref(&remote_path), "LICENSE", "Update LICENSE to 2024");

    assert!(
        matches!(
            result,
            Err(GitError::PushRejected { .. } | GitError::Push { .. })
        ),
        "expected push failure, got {result:?}"
    );
    assert_eq!(head_message(&remote_path), "initial");
    assert!(is_empty_dir(&clone_root));
}
