//! 写真ギャラリーコンポーネント
//!
//! カテゴリ絞り込み・検索・グループ表示を行う。

use crate::local_store::LocalFileStore;
use leptos::prelude::*;
use substation_intake_common::{
    category_counts, category_display_style, filter_records, group_by_category, Category,
    FileStore, GalleryFilter, ImageRecord,
};

fn confirm(message: &str) -> bool {
    web_sys::window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

#[component]
pub fn PhotoGallery<FD, FC>(
    records: ReadSignal<Vec<ImageRecord>>,
    on_delete: FD,
    on_delete_category: FC,
) -> impl IntoView
where
    FD: Fn(String) + 'static + Clone + Send,
    FC: Fn(Category) + 'static + Clone + Send,
{
    let (category, set_category) = signal(None::<Category>);
    let (search, set_search) = signal(String::new());
    let (grouped, set_grouped) = signal(true);

    let filter = move || {
        let filter = GalleryFilter::default().search(search.get());
        match category.get() {
            Some(c) => filter.category(c),
            None => filter,
        }
    };

    let filter_bar = move || {
        let all = records.get();
        let total = all.len();
        let buttons = category_counts(&all)
            .into_iter()
            .map(|(c, n)| {
                view! {
                    <button
                        class="btn btn-small filter-chip"
                        class:active=move || category.get() == Some(c)
                        on:click=move |_| set_category.set(Some(c))
                    >
                        {format!("{} ({})", c, n)}
                    </button>
                }
            })
            .collect_view();

        view! {
            <button
                class="btn btn-small filter-chip"
                class:active=move || category.get().is_none()
                on:click=move |_| set_category.set(None)
            >
                {format!("All ({})", total)}
            </button>
            {buttons}
        }
    };

    let body = {
        let on_delete = on_delete.clone();
        let on_delete_category = on_delete_category.clone();
        move || {
            let all = records.get();
            let visible = filter_records(&all, &filter());

            if visible.is_empty() {
                let message = match category.get() {
                    Some(c) => format!("No files in {} category", c),
                    None if all.is_empty() => "No files uploaded yet".to_string(),
                    None => "No files match the search".to_string(),
                };
                return view! { <p class="text-muted">{message}</p> }.into_any();
            }

            if grouped.get() {
                group_by_category(visible)
                    .into_iter()
                    .map(|(c, items)| {
                        let on_delete_category = on_delete_category.clone();
                        let cards = cards(items, on_delete.clone());
                        view! {
                            <section class="category-group">
                                <div class="category-header">
                                    <span class=format!("badge {}", category_display_style(c))>
                                        {format!("{} ({})", c, cards.len())}
                                    </span>
                                    <button
                                        class="btn btn-tertiary btn-small"
                                        on:click=move |_| {
                                            if confirm(&format!("Delete all files in {}?", c)) {
                                                on_delete_category(c);
                                            }
                                        }
                                    >
                                        "カテゴリ内を全削除"
                                    </button>
                                </div>
                                <div class="photo-gallery">{cards}</div>
                            </section>
                        }
                    })
                    .collect_view()
                    .into_any()
            } else {
                view! { <div class="photo-gallery">{cards(visible, on_delete.clone())}</div> }.into_any()
            }
        }
    };

    view! {
        <div class="gallery">
            <div class="gallery-toolbar">
                <div class="filter-chips">{filter_bar}</div>
                <input
                    type="search"
                    placeholder="ファイル名・場所・日付で検索..."
                    prop:value=move || search.get()
                    on:input=move |ev| set_search.set(event_target_value(&ev))
                />
                <button
                    class="btn btn-secondary btn-small"
                    on:click=move |_| set_grouped.update(|g| *g = !*g)
                >
                    {move || if grouped.get() { "グリッド表示" } else { "カテゴリ別表示" }}
                </button>
            </div>
            {body}
        </div>
    }
}

fn cards<FD>(items: Vec<&ImageRecord>, on_delete: FD) -> Vec<AnyView>
where
    FD: Fn(String) + 'static + Clone + Send,
{
    items
        .into_iter()
        .map(|record| {
            view! { <PhotoCard record=record.clone() on_delete=on_delete.clone() /> }.into_any()
        })
        .collect()
}

#[component]
fn PhotoCard<FD>(record: ImageRecord, on_delete: FD) -> impl IntoView
where
    FD: Fn(String) + 'static + Clone + Send,
{
    let url = LocalFileStore.retrieve_url(&record.storage_path).ok();
    let is_pdf = record.mime_type == "application/pdf";
    let field = |v: &str| if v.is_empty() { "-".to_string() } else { v.to_string() };

    let preview = match (url, is_pdf) {
        (Some(url), false) => view! { <img src=url alt=record.filename.clone() /> }.into_any(),
        (Some(url), true) => view! {
            <a class="pdf-preview" href=url target="_blank">"📄 PDF"</a>
        }
        .into_any(),
        (None, _) => view! { <div class="pdf-preview">"⚠ 本体なし"</div> }.into_any(),
    };

    view! {
        <div class="photo-card">
            {preview}
            <div class="photo-info">
                <h4>{record.filename.clone()}</h4>
                <span class=format!("badge {}", category_display_style(record.category))>
                    {record.category.label()}
                </span>
                <p>{format!("場所: {}", field(&record.location))}</p>
                <p>{format!("日付: {}  連番: {}", field(&record.date_taken), field(&record.sequence))}</p>
                <div class="photo-actions">
                    <button
                        class="btn btn-tertiary btn-small"
                        on:click={
                            let id = record.id.clone();
                            move |_| on_delete(id.clone())
                        }
                    >
                        "削除"
                    </button>
                </div>
            </div>
        </div>
    }
}
