//! アップロードエリアコンポーネント

use leptos::prelude::*;
use substation_intake_common::{
    category_display_style, validate_batch, BatchOutcome, ImageRecord, UploadCandidate, UploadFile,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{DragEvent, File, FileList};

#[component]
pub fn UploadArea<F>(
    owner: ReadSignal<Option<String>>,
    records: ReadSignal<Vec<ImageRecord>>,
    is_uploading: ReadSignal<bool>,
    on_upload: F,
) -> impl IntoView
where
    F: Fn(Vec<UploadFile>) + 'static + Clone + Send,
{
    let (is_dragover, set_is_dragover) = signal(false);
    let (pending, set_pending) = signal(Vec::<UploadFile>::new());
    let is_enabled = move || owner.get().is_some() && !is_uploading.get();

    // アップロード前の検証（既存ファイル名との重複も含む）
    let outcome = move || -> BatchOutcome {
        let candidates: Vec<UploadCandidate> =
            pending.with(|files| files.iter().map(|f| f.candidate.clone()).collect());
        let existing: Vec<String> =
            records.with(|list| list.iter().map(|r| r.filename.clone()).collect());
        validate_batch(&candidates, &existing)
    };

    let handle_files = move |files: FileList| {
        let selected: Vec<File> = (0..files.length()).filter_map(|i| files.get(i)).collect();
        if selected.is_empty() {
            return;
        }
        wasm_bindgen_futures::spawn_local(async move {
            let read = read_files(selected).await;
            set_pending.update(|p| p.extend(read));
        });
    };

    let on_submit = move |_| {
        let accepted: Vec<usize> = outcome().accepted.iter().map(|a| a.index).collect();
        let files = pending.get();
        let selected: Vec<UploadFile> = files
            .into_iter()
            .enumerate()
            .filter(|(i, _)| accepted.contains(i))
            .map(|(_, f)| f)
            .collect();
        set_pending.set(Vec::new());
        if !selected.is_empty() {
            on_upload(selected);
        }
    };

    let remove_pending = move |index: usize| set_pending.update(|p| remove_at(p, index));

    let preview = move || {
        let outcome = outcome();
        let accepted = outcome
            .accepted
            .into_iter()
            .map(|a| {
                let index = a.index;
                view! {
                    <li>
                        <span class=format!("badge {}", category_display_style(a.parsed.category))>
                            {a.parsed.category.label()}
                        </span>
                        " "{a.candidate.file_name}
                        <button class="btn btn-tertiary btn-small" on:click=move |_| remove_pending(index)>
                            "×"
                        </button>
                    </li>
                }
            })
            .collect_view();
        let rejected = outcome
            .rejected
            .into_iter()
            .map(|r| {
                let index = r.index;
                view! {
                    <li class="rejected">
                        {format!("{} - {}", r.candidate.file_name, r.reason)}
                        <button class="btn btn-tertiary btn-small" on:click=move |_| remove_pending(index)>
                            "×"
                        </button>
                    </li>
                }
            })
            .collect_view();
        view! {
            <ul class="selected-files">{accepted}</ul>
            <ul class="rejections">{rejected}</ul>
        }
    };

    let on_drop = {
        move |ev: DragEvent| {
            ev.prevent_default();
            set_is_dragover.set(false);

            if !is_enabled() {
                return;
            }

            if let Some(files) = ev.data_transfer().and_then(|dt| dt.files()) {
                handle_files(files);
            }
        }
    };

    let on_dragover = move |ev: DragEvent| {
        ev.prevent_default();
        if is_enabled() {
            set_is_dragover.set(true);
        }
    };

    let on_dragleave = move |_: DragEvent| {
        set_is_dragover.set(false);
    };

    let on_click = {
        move |_| {
            if !is_enabled() {
                return;
            }

            // ファイル選択ダイアログを開く
            let Some(input) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.create_element("input").ok())
                .and_then(|e| e.dyn_into::<web_sys::HtmlInputElement>().ok())
            else {
                return;
            };
            input.set_type("file");
            input.set_accept("image/jpeg,image/png,image/tiff,application/pdf");
            input.set_multiple(true);

            let input_clone = input.clone();
            let closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
                if let Some(files) = input_clone.files() {
                    handle_files(files);
                }
            }) as Box<dyn FnMut(_)>);

            input.set_onchange(Some(closure.as_ref().unchecked_ref()));
            closure.forget();
            input.click();
        }
    };

    view! {
        <div class="upload-panel">
        <div
            class=move || {
                let mut classes = vec!["upload-area"];
                if is_dragover.get() {
                    classes.push("dragover");
                }
                if !is_enabled() {
                    classes.push("disabled");
                }
                classes.join(" ")
            }
            on:drop=on_drop
            on:dragover=on_dragover
            on:dragleave=on_dragleave
            on:click=on_click
        >
            <Show
                when=move || owner.get().is_some()
                fallback=|| view! {
                    <div class="upload-icon">"🔑"</div>
                    <p>"サインインしてください"</p>
                    <p class="text-muted">"点検者IDでサインインするとファイルをアップロードできます"</p>
                }
            >
                <div class="upload-icon">{move || if is_uploading.get() { "⏳" } else { "📷" }}</div>
                <p>"ファイルをドラッグ&ドロップ または クリックして選択"</p>
                <p class="text-muted">"写真: JPEG, PNG, TIFF / 試験成績書: PDF"</p>
                <p class="text-muted">"例: vi_switchgear_image.jpg, sc_transformer_location_date.jpg, ts_cbm_test.pdf"</p>
            </Show>
        </div>
        <Show when=move || !pending.get().is_empty()>
            {preview}
            <div class="api-actions">
                <button
                    class="btn btn-primary"
                    disabled=move || !is_enabled() || outcome().accepted.is_empty()
                    on:click=on_submit.clone()
                >
                    {move || format!("アップロード ({}件)", outcome().accepted.len())}
                </button>
                <button class="btn btn-tertiary" on:click=move |_| set_pending.set(Vec::new())>
                    "クリア"
                </button>
            </div>
        </Show>
        </div>
    }
}

/// 選択済みの1件だけ取り除く（範囲外は無視）
fn remove_at(pending: &mut Vec<UploadFile>, index: usize) {
    if index < pending.len() {
        pending.remove(index);
    }
}

/// 選択順を保ったまま本体を読み込む
async fn read_files(files: Vec<File>) -> Vec<UploadFile> {
    let mut uploads = Vec::with_capacity(files.len());
    for file in files {
        let bytes = match JsFuture::from(file.array_buffer()).await {
            Ok(buffer) => js_sys::Uint8Array::new(&buffer).to_vec(),
            Err(e) => {
                web_sys::console::warn_1(&format!("読込失敗 {}: {:?}", file.name(), e).into());
                continue;
            }
        };
        uploads.push(UploadFile::new(file.name(), file.type_(), bytes));
    }
    uploads
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn candidates(files: &[UploadFile]) -> Vec<UploadCandidate> {
        files.iter().map(|f| f.candidate.clone()).collect()
    }

    #[wasm_bindgen_test]
    fn test_remove_one_pending_file() {
        let mut pending = vec![
            UploadFile::new("vi_ptx_1.jpg", "image/jpeg", vec![1]),
            UploadFile::new("bad-name.jpg", "image/jpeg", vec![2]),
            UploadFile::new("ts_cbm_1.pdf", "application/pdf", vec![3]),
        ];
        let existing: [&str; 0] = [];

        let outcome = validate_batch(&candidates(&pending), &existing);
        assert_eq!(outcome.rejected.len(), 1);

        remove_at(&mut pending, outcome.rejected[0].index);
        let names: Vec<&str> = pending.iter().map(|f| f.candidate.file_name.as_str()).collect();
        assert_eq!(names, vec!["vi_ptx_1.jpg", "ts_cbm_1.pdf"]);
        assert!(validate_batch(&candidates(&pending), &existing).is_all_accepted());

        // 範囲外は何もしない
        remove_at(&mut pending, 5);
        assert_eq!(pending.len(), 2);
    }
}
