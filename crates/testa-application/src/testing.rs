//! In-memory assistant service used by the application tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use testa_core::assistant::{
    Assistant, AssistantService, CodeInterpreterResources, ContentItem, FileObject, MessageRole,
    Run, RunError, RunStatus, Thread, ThreadMessage, ToolResources, Usage,
};
use testa_core::{Result, TestaError};

pub const TEST_ASSISTANT_ID: &str = "asst_test";

/// Number of calls per remote operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub create_thread: usize,
    pub create_message: usize,
    pub create_run: usize,
    pub cancel_run: usize,
    pub retrieve_run: usize,
    pub list_runs: usize,
    pub list_messages: usize,
    pub file_content: usize,
    pub retrieve_file: usize,
    pub retrieve_assistant: usize,
}

#[derive(Default)]
struct ThreadState {
    runs: Vec<Run>,
    messages: Vec<ThreadMessage>,
}

struct State {
    next_id: u64,
    threads: HashMap<String, ThreadState>,
    assistant: Assistant,
    run_model: String,
    run_usage: Usage,
    status_script: VecDeque<RunStatus>,
    stuck: bool,
    hang_retrieve: bool,
    cancelling: HashSet<String>,
    replies: VecDeque<Vec<ContentItem>>,
    files: HashMap<String, (String, Vec<u8>)>,
    failing: HashSet<&'static str>,
    calls: CallCounts,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn fail_if(&self, op: &'static str) -> Result<()> {
        if self.failing.contains(op) {
            return Err(TestaError::Remote {
                status: Some(500),
                message: format!("{op} failed"),
                retryable: true,
                retry_after: None,
            });
        }
        Ok(())
    }

    fn thread(&mut self, thread_id: &str) -> Result<&mut ThreadState> {
        self.threads.get_mut(thread_id).ok_or_else(|| TestaError::Remote {
            status: Some(404),
            message: format!("No thread found with id '{thread_id}'."),
            retryable: false,
            retry_after: None,
        })
    }
}

/// Scriptable fake of the remote assistant service.
pub struct FakeAssistantService {
    state: Mutex<State>,
}

impl FakeAssistantService {
    /// Creates a fake whose assistant (and runs) use `model`.
    pub fn new(model: &str) -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 0,
                threads: HashMap::new(),
                assistant: Assistant {
                    id: TEST_ASSISTANT_ID.to_string(),
                    name: Some("Test analyst".to_string()),
                    model: model.to_string(),
                    instructions: None,
                    tool_resources: None,
                },
                run_model: model.to_string(),
                run_usage: Usage::default(),
                status_script: VecDeque::new(),
                stuck: false,
                hang_retrieve: false,
                cancelling: HashSet::new(),
                replies: VecDeque::new(),
                files: HashMap::new(),
                failing: HashSet::new(),
                calls: CallCounts::default(),
            }),
        }
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    pub fn add_file(&self, file_id: &str, filename: &str, bytes: &[u8]) {
        self.state
            .lock()
            .unwrap()
            .files
            .insert(file_id.to_string(), (filename.to_string(), bytes.to_vec()));
    }

    /// Attaches files to the assistant's code interpreter.
    pub fn set_code_interpreter_files(&self, file_ids: &[&str]) {
        self.state.lock().unwrap().assistant.tool_resources = Some(ToolResources {
            code_interpreter: Some(CodeInterpreterResources {
                file_ids: file_ids.iter().map(|id| id.to_string()).collect(),
            }),
            file_search: None,
        });
    }

    /// Statuses returned by successive `retrieve_run` calls; `Completed` once exhausted.
    pub fn script_statuses(&self, statuses: impl IntoIterator<Item = RunStatus>) {
        self.state.lock().unwrap().status_script = statuses.into_iter().collect();
    }

    /// Makes every run report `in_progress` forever.
    pub fn set_stuck(&self, stuck: bool) {
        self.state.lock().unwrap().stuck = stuck;
    }

    /// Makes every `retrieve_run` call wait forever without answering.
    pub fn set_hang_retrieve(&self, hang: bool) {
        self.state.lock().unwrap().hang_retrieve = hang;
    }

    /// Model and usage reported by runs created from now on.
    pub fn set_run_usage(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) {
        let mut state = self.state.lock().unwrap();
        state.run_model = model.to_string();
        state.run_usage = Usage {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        };
    }

    /// Content the assistant posts when the next run completes.
    pub fn queue_reply(&self, content: Vec<ContentItem>) {
        self.state.lock().unwrap().replies.push_back(content);
    }

    /// Creates a thread directly, bypassing call counting.
    pub fn seed_thread(&self) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("thread");
        state.threads.insert(id.clone(), ThreadState::default());
        id
    }

    /// Adds an already finished run to a thread.
    pub fn push_run(&self, thread_id: &str, model: &str, prompt_tokens: u64, completion_tokens: u64) {
        let mut state = self.state.lock().unwrap();
        let id = state.id("run");
        let thread = state.threads.get_mut(thread_id).expect("unknown thread");
        thread.runs.push(Run {
            id,
            thread_id: thread_id.to_string(),
            status: RunStatus::Completed,
            model: model.to_string(),
            usage: Some(Usage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
            last_error: None,
        });
    }

    /// Appends a message to a thread's history.
    pub fn push_message(&self, thread_id: &str, role: MessageRole, content: Vec<ContentItem>) {
        let mut state = self.state.lock().unwrap();
        let id = state.id("msg");
        let thread = state.threads.get_mut(thread_id).expect("unknown thread");
        thread.messages.push(ThreadMessage { id, role, content });
    }

    /// Makes the named operation fail with a 500 until cleared.
    pub fn fail(&self, op: &'static str) {
        self.state.lock().unwrap().failing.insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failing.remove(op);
    }
}

#[async_trait]
impl AssistantService for FakeAssistantService {
    async fn create_thread(&self) -> Result<Thread> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_thread += 1;
        state.fail_if("create_thread")?;
        let id = state.id("thread");
        state.threads.insert(id.clone(), ThreadState::default());
        Ok(Thread { id })
    }

    async fn create_message(
        &self,
        thread_id: &str,
        role: MessageRole,
        content: &str,
    ) -> Result<ThreadMessage> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_message += 1;
        state.fail_if("create_message")?;
        if let Some(active) = state
            .thread(thread_id)?
            .runs
            .iter()
            .find(|r| !r.status.is_terminal())
        {
            return Err(TestaError::Remote {
                status: Some(400),
                message: format!(
                    "Can't add messages to {thread_id} while a run {} is active.",
                    active.id
                ),
                retryable: false,
                retry_after: None,
            });
        }
        let id = state.id("msg");
        let message = ThreadMessage {
            id,
            role,
            content: vec![ContentItem::text(content)],
        };
        state.thread(thread_id)?.messages.push(message.clone());
        Ok(message)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_run += 1;
        state.fail_if("create_run")?;
        if assistant_id != state.assistant.id {
            return Err(TestaError::Remote {
                status: Some(404),
                message: format!("No assistant found with id '{assistant_id}'."),
                retryable: false,
                retry_after: None,
            });
        }
        let id = state.id("run");
        let run = Run {
            id,
            thread_id: thread_id.to_string(),
            status: RunStatus::Queued,
            model: state.run_model.clone(),
            usage: None,
            last_error: None,
        };
        state.thread(thread_id)?.runs.push(run.clone());
        Ok(run)
    }

    async fn cancel_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.cancel_run += 1;
        state.fail_if("cancel_run")?;
        let run = state
            .thread(thread_id)?
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| TestaError::not_found("run", run_id))?;
        if run.status.is_terminal() {
            return Err(TestaError::Remote {
                status: Some(400),
                message: format!("Cannot cancel run with status '{}'.", run.status),
                retryable: false,
                retry_after: None,
            });
        }
        run.status = RunStatus::Cancelling;
        let run = run.clone();
        state.cancelling.insert(run_id.to_string());
        Ok(run)
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let hang = {
            let mut state = self.state.lock().unwrap();
            state.calls.retrieve_run += 1;
            state.hang_retrieve
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let mut state = self.state.lock().unwrap();
        state.fail_if("retrieve_run")?;

        let next = if state.cancelling.remove(run_id) {
            RunStatus::Cancelled
        } else if state.stuck {
            RunStatus::InProgress
        } else {
            state.status_script.pop_front().unwrap_or(RunStatus::Completed)
        };
        let usage = state.run_usage;
        let reply = if next == RunStatus::Completed {
            state.replies.pop_front()
        } else {
            None
        };
        let reply_id = state.id("msg");

        let thread = state.thread(thread_id)?;
        let run = thread
            .runs
            .iter_mut()
            .find(|r| r.id == run_id)
            .ok_or_else(|| TestaError::not_found("run", run_id))?;
        if run.status.is_terminal() {
            return Ok(run.clone());
        }

        run.status = next;
        if next.is_terminal() {
            run.usage = Some(usage);
        }
        if next == RunStatus::Failed {
            run.last_error = Some(RunError {
                code: "server_error".to_string(),
                message: "Sorry, something went wrong.".to_string(),
            });
        }
        let run = run.clone();

        if let Some(content) = reply {
            thread.messages.push(ThreadMessage {
                id: reply_id,
                role: MessageRole::Assistant,
                content,
            });
        }
        Ok(run)
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<Run>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_runs += 1;
        state.fail_if("list_runs")?;
        Ok(state.thread(thread_id)?.runs.clone())
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<ThreadMessage>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_messages += 1;
        state.fail_if("list_messages")?;
        Ok(state.thread(thread_id)?.messages.clone())
    }

    async fn file_content(&self, file_id: &str) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.calls.file_content += 1;
        state.fail_if("file_content")?;
        state
            .files
            .get(file_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| TestaError::Remote {
                status: Some(404),
                message: format!("No such File object: {file_id}"),
                retryable: false,
                retry_after: None,
            })
    }

    async fn retrieve_file(&self, file_id: &str) -> Result<FileObject> {
        let mut state = self.state.lock().unwrap();
        state.calls.retrieve_file += 1;
        state.fail_if("retrieve_file")?;
        state
            .files
            .get(file_id)
            .map(|(filename, bytes)| FileObject {
                id: file_id.to_string(),
                filename: filename.clone(),
                bytes: Some(bytes.len() as u64),
            })
            .ok_or_else(|| TestaError::Remote {
                status: Some(404),
                message: format!("No such File object: {file_id}"),
                retryable: false,
                retry_after: None,
            })
    }

    async fn retrieve_assistant(&self, assistant_id: &str) -> Result<Assistant> {
        let mut state = self.state.lock().unwrap();
        state.calls.retrieve_assistant += 1;
        state.fail_if("retrieve_assistant")?;
        if assistant_id != state.assistant.id {
            return Err(TestaError::Remote {
                status: Some(404),
                message: format!("No assistant found with id '{assistant_id}'."),
                retryable: false,
                retry_after: None,
            });
        }
        Ok(state.assistant.clone())
    }
}
