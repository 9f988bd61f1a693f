//! メインアプリケーションコンポーネント

use crate::components::{
    auth_panel::AuthPanel, header::Header, photo_gallery::PhotoGallery, upload_area::UploadArea,
};
use crate::local_store::{open_service, SessionAuth};
use leptos::prelude::*;
use substation_intake_common::{Category, GalleryFilter, ImageRecord, UploadFile};

/// サインイン中の所有者のレコードを読み直す
fn load_records() -> Result<Vec<ImageRecord>, String> {
    open_service()
        .list(&GalleryFilter::default())
        .map_err(|e| e.to_string())
}

/// メインアプリケーションコンポーネント
#[component]
pub fn App() -> impl IntoView {
    let (owner, set_owner) = signal(SessionAuth::load().owner().map(String::from));
    let (records, set_records) = signal(load_records().unwrap_or_default());
    let (messages, set_messages) = signal(Vec::<String>::new());
    let (is_uploading, set_is_uploading) = signal(false);

    let refresh = move || match load_records() {
        Ok(list) => set_records.set(list),
        Err(_) => set_records.set(Vec::new()),
    };

    let on_sign_in = move |id: String| {
        let mut service = open_service();
        match service.auth_mut().sign_in(&id) {
            Ok(()) => {
                set_owner.set(Some(id.trim().to_string()));
                set_messages.set(Vec::new());
                refresh();
            }
            Err(e) => set_messages.set(vec![e.to_string()]),
        }
    };

    let on_sign_out = move |_| {
        open_service().auth_mut().sign_out();
        set_owner.set(None);
        set_records.set(Vec::new());
        set_messages.set(Vec::new());
    };

    let on_upload = move |files: Vec<UploadFile>| {
        set_is_uploading.set(true);
        let mut service = open_service();
        let lines = match service.upload(files) {
            Ok(report) => {
                let mut lines: Vec<String> = report
                    .rejected
                    .iter()
                    .map(|r| format!("{} - {}", r.candidate.file_name, r.reason))
                    .collect();
                lines.extend(
                    report
                        .failed
                        .iter()
                        .map(|f| format!("{} - {}", f.file_name, f.error)),
                );
                lines
            }
            Err(e) => vec![e.to_string()],
        };
        set_messages.set(lines);
        set_is_uploading.set(false);
        refresh();
    };

    let on_delete = move |id: String| {
        if let Err(e) = open_service().delete(&id) {
            set_messages.set(vec![e.to_string()]);
        }
        refresh();
    };

    let on_delete_category = move |category: Category| {
        if let Err(e) = open_service().delete_category(category) {
            set_messages.set(vec![e.to_string()]);
        }
        refresh();
    };

    view! {
        <div class="container">
            <Header />

            <AuthPanel owner=owner on_sign_in=on_sign_in on_sign_out=on_sign_out />

            <UploadArea
                owner=owner
                records=records
                is_uploading=is_uploading
                on_upload=on_upload
            />

            <Show when=move || !messages.get().is_empty()>
                <div class="rejections">
                    <p>"以下のファイルは取り込めませんでした:"</p>
                    <ul>
                        {move || messages.get().into_iter().map(|m| view! { <li>{m}</li> }).collect_view()}
                    </ul>
                </div>
            </Show>

            <Show when=move || owner.get().is_some()>
                <PhotoGallery
                    records=records
                    on_delete=on_delete
                    on_delete_category=on_delete_category
                />
            </Show>
        </div>
    }
}
