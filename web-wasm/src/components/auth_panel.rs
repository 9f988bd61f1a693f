//! サインインパネルコンポーネント

use leptos::prelude::*;

#[component]
pub fn AuthPanel<FI, FO>(
    owner: ReadSignal<Option<String>>,
    on_sign_in: FI,
    on_sign_out: FO,
) -> impl IntoView
where
    FI: Fn(String) + 'static + Clone + Send,
    FO: Fn(()) + 'static + Clone + Send,
{
    let (draft, set_draft) = signal(String::new());

    view! {
        <div class="settings-panel">
            <Show
                when=move || owner.get().is_some()
                fallback={
                    let on_sign_in = on_sign_in.clone();
                    move || {
                        let on_sign_in = on_sign_in.clone();
                        view! {
                            <div class="form-group">
                                <label for="owner-id">"点検者ID"</label>
                                <input
                                    type="text"
                                    id="owner-id"
                                    placeholder="IDを入力..."
                                    prop:value=move || draft.get()
                                    on:input=move |ev| set_draft.set(event_target_value(&ev))
                                />
                                <button
                                    class="btn btn-primary btn-small"
                                    on:click=move |_| on_sign_in(draft.get())
                                >
                                    "サインイン"
                                </button>
                            </div>
                        }
                    }
                }
            >
                <div class="form-group">
                    <span class="api-key-status">
                        {move || format!("サインイン中: {}", owner.get().unwrap_or_default())}
                    </span>
                    <button
                        class="btn btn-tertiary btn-small"
                        on:click={
                            let on_sign_out = on_sign_out.clone();
                            move |_| on_sign_out(())
                        }
                    >
                        "サインアウト"
                    </button>
                </div>
            </Show>
        </div>
    }
}
